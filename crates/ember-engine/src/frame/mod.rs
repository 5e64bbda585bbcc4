//! Per-frame driver.
//!
//! `FrameDriver` owns the render-loop state machine and decides *what* happens
//! on each timer tick (resize detection, lazy pipeline build, uniform update,
//! acquire → record → submit → present → poll). `FrameBackend` is the seam that
//! performs the GPU work; `WgpuBackend` is the real implementation.
//!
//! The driver never owns the thread: a host calls `initialize`, `run` and
//! `render_frame` from its own event loop.

mod backend;
mod config;
mod driver;
mod wgpu_backend;

pub use backend::FrameBackend;
pub use config::FrameConfig;
pub use driver::{DriverState, FrameDriver, FrameStats, FrameStatus};
pub use wgpu_backend::WgpuBackend;
