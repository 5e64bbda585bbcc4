//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and drives a [`FrameDriver`] from
//! window events and a fixed-interval timer.
//!
//! [`FrameDriver`]: crate::frame::FrameDriver

mod notice;
mod runtime;

pub use notice::FailureNotice;
pub use runtime::{HostEvent, Runtime, RuntimeConfig};
