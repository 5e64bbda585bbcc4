//! Ember engine crate.
//!
//! A minimal GPU widget core: negotiates an adapter and device, owns the
//! presentation surface, and drives a fixed-interval render loop that draws a
//! rotating quad with MSAA and depth. `window` hosts it in a winit window.

pub mod device;
pub mod frame;
pub mod logging;
pub mod pipeline;
pub mod resources;
pub mod time;
pub mod window;
