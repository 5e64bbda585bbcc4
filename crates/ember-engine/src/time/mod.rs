//! Time subsystem.
//!
//! Provides stable, testable timing utilities without coupling to the runtime:
//! - `FrameClock` measures elapsed render time from the moment the loop starts
//! - `FrameTimer` emulates the host toolkit's fixed-interval frame timer

mod frame_clock;
mod frame_timer;

pub use frame_clock::FrameClock;
pub use frame_timer::FrameTimer;
