use anyhow::{Context, Result};

use crate::device::{
    ErrorScope, GpuContext, GpuInit, SurfaceErrorAction, SurfaceSize, surface_error_action,
};
use crate::pipeline::{DrawCall, PipelineBundle};
use crate::resources::{DEPTH_FORMAT, FrameTargets, SurfaceFrame, next_surface_frame};

use super::{FrameBackend, FrameConfig};

/// wgpu implementation of [`FrameBackend`].
///
/// Every tick runs inside a `render_frame` validation scope, and each step opens
/// its own nested scope so reports name the step that failed. Scope results are
/// collected when the device is polled at the end of the tick.
pub struct WgpuBackend<'w> {
    /// Scope spanning the current tick; closed in `end_tick`.
    frame_scope: Option<ErrorScope>,

    ctx: GpuContext<'w>,
    format: wgpu::TextureFormat,
    config: FrameConfig,
}

impl<'w> WgpuBackend<'w> {
    /// Creates the instance and surface for `target` and negotiates a device.
    pub fn connect(
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        init: GpuInit,
        config: FrameConfig,
    ) -> Result<Self> {
        let ctx = GpuContext::for_window(target, init)?;
        Self::from_context(ctx, config)
    }

    /// Wraps an existing context. The context must own a surface.
    pub fn from_context(ctx: GpuContext<'w>, config: FrameConfig) -> Result<Self> {
        anyhow::ensure!(ctx.surface().is_some(), "frame backend requires a surface");
        let format = ctx
            .surface_format()
            .context("surface format was not committed")?;

        Ok(Self {
            frame_scope: None,
            ctx,
            format,
            config,
        })
    }

    fn record_bundle(
        &self,
        pipeline: &PipelineBundle,
        bind_group: &wgpu::BindGroup,
        draw: &DrawCall,
    ) -> wgpu::RenderBundle {
        let color_formats = [Some(self.format)];
        let mut encoder =
            self.ctx
                .device()
                .create_render_bundle_encoder(&wgpu::RenderBundleEncoderDescriptor {
                    label: Some("ember quad bundle encoder"),
                    color_formats: &color_formats,
                    depth_stencil: Some(wgpu::RenderBundleDepthStencil {
                        format: DEPTH_FORMAT,
                        depth_read_only: false,
                        stencil_read_only: true,
                    }),
                    sample_count: self.config.sample_count,
                    ..Default::default()
                });

        encoder.set_pipeline(&pipeline.pipeline);
        encoder.set_bind_group(0, bind_group, &[]);
        encoder.draw(draw.vertices.clone(), draw.instances.clone());

        encoder.finish(&wgpu::RenderBundleDescriptor {
            label: Some("ember quad bundle"),
        })
    }
}

impl FrameBackend for WgpuBackend<'_> {
    type Targets = FrameTargets;
    type Pipeline = PipelineBundle;
    type Frame = SurfaceFrame;

    fn begin_tick(&mut self) {
        self.frame_scope = Some(self.ctx.error_scope("render_frame"));
    }

    fn configure_surface(&mut self, size: SurfaceSize) -> Result<()> {
        self.ctx.configure_surface(size)
    }

    fn create_targets(&mut self, size: SurfaceSize) -> FrameTargets {
        let _scope = self.ctx.error_scope("create_frame_targets");
        FrameTargets::new(self.ctx.device(), self.format, size, self.config.sample_count)
    }

    fn build_pipeline(&mut self) -> PipelineBundle {
        let _scope = self.ctx.error_scope("build_pipeline");
        log::info!("creating render pipeline ({:?}, {}x MSAA)", self.format, self.config.sample_count);
        PipelineBundle::new(self.ctx.device(), self.format, self.config.sample_count)
    }

    fn write_uniforms(&mut self, pipeline: &PipelineBundle, elapsed: f32) {
        pipeline.write_time(self.ctx.queue(), elapsed);
    }

    fn acquire_frame(&mut self) -> Result<SurfaceFrame, wgpu::SurfaceError> {
        let Some(surface) = self.ctx.surface() else {
            return Err(wgpu::SurfaceError::Lost);
        };
        let _scope = self.ctx.error_scope("acquire_surface_frame");
        next_surface_frame(surface)
    }

    fn recover_surface(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        let action = surface_error_action(&err);
        log::warn!("surface acquisition failed: {err} ({action:?})");

        if action == SurfaceErrorAction::Reconfigured && !self.ctx.reconfigure() {
            return SurfaceErrorAction::SkipFrame;
        }
        action
    }

    fn submit(
        &mut self,
        frame: &SurfaceFrame,
        targets: &FrameTargets,
        pipeline: &PipelineBundle,
        draw: &DrawCall,
    ) {
        let device = self.ctx.device();

        let bind_group = pipeline.bind_group(device);
        let bundle = self.record_bundle(pipeline, &bind_group, draw);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ember frame encoder"),
        });

        {
            let mut rpass =
                begin_main_pass(&mut encoder, &frame.view, targets, self.config.clear_color);
            rpass.execute_bundles(std::iter::once(&bundle));
        }

        self.ctx.queue().submit(std::iter::once(encoder.finish()));
    }

    fn present(&mut self, frame: SurfaceFrame) {
        frame.present();
    }

    fn end_tick(&mut self) {
        // Close the frame scope first so its pop is drained by this tick's poll.
        drop(self.frame_scope.take());
        self.ctx.tick();
    }
}

/// Begins the main pass: clear color + depth, resolve MSAA into `surface_view`.
fn begin_main_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    surface_view: &wgpu::TextureView,
    targets: &FrameTargets,
    clear: wgpu::Color,
) -> wgpu::RenderPass<'e> {
    let (view, resolve_target) = match targets.msaa_view.as_ref() {
        Some(msaa) => (msaa, Some(surface_view)),
        None => (surface_view, None),
    };

    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("ember main pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &targets.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
