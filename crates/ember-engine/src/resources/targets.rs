use crate::device::SurfaceSize;

use super::textures::{create_depth_texture, create_multisample_texture};

/// Size-dependent render targets for one surface configuration.
///
/// Never resized in place: a new `FrameTargets` replaces the old one whenever
/// the committed surface size changes.
pub struct FrameTargets {
    /// MSAA color attachment; `None` when rendering single-sampled.
    pub msaa: Option<wgpu::Texture>,
    pub msaa_view: Option<wgpu::TextureView>,

    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,

    pub size: SurfaceSize,
    pub sample_count: u32,
}

impl FrameTargets {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        size: SurfaceSize,
        sample_count: u32,
    ) -> Self {
        let size = size.clamped();

        let msaa = (sample_count > 1)
            .then(|| create_multisample_texture(device, color_format, size, sample_count));
        let msaa_view = msaa
            .as_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));

        let depth = create_depth_texture(device, size, sample_count);
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            msaa,
            msaa_view,
            depth,
            depth_view,
            size,
            sample_count,
        }
    }

    /// `true` when these targets can be used for a surface of `size`.
    pub fn matches(&self, size: SurfaceSize) -> bool {
        self.size == size.clamped()
    }
}
