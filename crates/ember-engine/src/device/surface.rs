use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero (e.g. a minimized window).
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same size with each dimension raised to at least 1.
    ///
    /// wgpu rejects zero-sized textures.
    #[inline]
    pub fn clamped(self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }

    #[inline]
    pub fn extent(self) -> wgpu::Extent3d {
        let s = self.clamped();
        wgpu::Extent3d {
            width: s.width,
            height: s.height,
            depth_or_array_layers: 1,
        }
    }
}

impl From<PhysicalSize<u32>> for SurfaceSize {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Picks the surface format to commit to.
///
/// The first supported format is the default. With `prefer_srgb`, an sRGB
/// 8-bit format wins when the surface offers one.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = caps.formats.first().copied()?;

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }

    Some(first)
}

pub(crate) fn surface_configuration(
    format: wgpu::TextureFormat,
    size: SurfaceSize,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
    desired_maximum_frame_latency: u32,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency,
    }
}

/// Classifies an acquisition failure.
///
/// `Lost` and `Outdated` ask the caller to reconfigure and try again.
pub(crate) fn surface_error_action(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        #[allow(unreachable_patterns)]
        _ => SurfaceErrorAction::SkipFrame,
    }
}
