use crate::device::SurfaceSize;

/// Depth buffer format used by every pass and pipeline in this crate.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Creates a color texture usable as a multisampled render attachment.
///
/// Dimensions are clamped to at least 1x1.
pub fn create_multisample_texture(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: SurfaceSize,
    sample_count: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("ember msaa color"),
        size: size.extent(),
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

/// Creates a 32-bit float depth texture.
///
/// Dimensions are clamped to at least 1x1.
pub fn create_depth_texture(
    device: &wgpu::Device,
    size: SurfaceSize,
    sample_count: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("ember depth"),
        size: size.extent(),
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

/// Represents a single acquired swapchain image.
///
/// This object is short-lived and must be presented promptly. Holding the
/// surface texture prevents acquisition of subsequent frames.
pub struct SurfaceFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl SurfaceFrame {
    /// Presents the image. Must follow the submission that renders into it.
    pub fn present(self) {
        drop(self.view);
        self.surface_texture.present();
    }
}

/// Acquires the next presentable texture from `surface`.
///
/// Optimal and suboptimal acquisitions both succeed; suboptimal ones are only
/// logged. The view is 2D, single mip, all aspects.
pub fn next_surface_frame(
    surface: &wgpu::Surface<'_>,
) -> Result<SurfaceFrame, wgpu::SurfaceError> {
    let surface_texture = surface.get_current_texture()?;
    if surface_texture.suboptimal {
        log::debug!("acquired a suboptimal surface texture");
    }

    let view = surface_texture
        .texture
        .create_view(&wgpu::TextureViewDescriptor {
            label: Some("ember surface view"),
            format: Some(surface_texture.texture.format()),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            ..Default::default()
        });

    Ok(SurfaceFrame {
        surface_texture,
        view,
    })
}
