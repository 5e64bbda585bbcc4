//! Resource factory.
//!
//! Free functions over a device and a viewport size; no hidden state. Callers
//! decide when to recreate (see [`FrameTargets`]) and which error scope to wrap
//! the calls in.

mod targets;
mod textures;

pub use targets::FrameTargets;
pub use textures::{
    DEPTH_FORMAT, SurfaceFrame, create_depth_texture, create_multisample_texture,
    next_surface_frame,
};
