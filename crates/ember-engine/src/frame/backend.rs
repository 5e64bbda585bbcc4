use crate::device::{SurfaceErrorAction, SurfaceSize};
use crate::pipeline::DrawCall;

/// GPU operations the frame driver sequences.
///
/// The driver calls these in a fixed order within one tick:
/// `begin_tick`, optionally `configure_surface` + `create_targets`, optionally
/// `build_pipeline`, `write_uniforms`, `acquire_frame` (with `recover_surface`
/// on failure), `submit`, `present`, `end_tick`.
pub trait FrameBackend {
    /// Size-dependent render targets (MSAA color + depth).
    type Targets;
    /// Resolution-independent pipeline state.
    type Pipeline;
    /// One acquired presentable image.
    type Frame;

    /// Called before anything else in a tick.
    fn begin_tick(&mut self) {}

    /// Configures the presentation surface for `size`.
    fn configure_surface(&mut self, size: SurfaceSize) -> anyhow::Result<()>;

    /// Allocates render targets for `size`.
    fn create_targets(&mut self, size: SurfaceSize) -> Self::Targets;

    /// Builds the pipeline. Called once per backend lifetime.
    fn build_pipeline(&mut self) -> Self::Pipeline;

    /// Uploads the elapsed time (seconds since the loop started).
    fn write_uniforms(&mut self, pipeline: &Self::Pipeline, elapsed: f32);

    /// Acquires the next presentable image.
    fn acquire_frame(&mut self) -> Result<Self::Frame, wgpu::SurfaceError>;

    /// Reacts to an acquisition failure (e.g. by reconfiguring the surface).
    fn recover_surface(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction;

    /// Records the draw into `frame` and submits it to the queue.
    fn submit(
        &mut self,
        frame: &Self::Frame,
        targets: &Self::Targets,
        pipeline: &Self::Pipeline,
        draw: &DrawCall,
    );

    /// Presents `frame`. Always follows `submit`.
    fn present(&mut self, frame: Self::Frame);

    /// Called last in a tick, on every path that called `begin_tick`.
    fn end_tick(&mut self) {}
}
