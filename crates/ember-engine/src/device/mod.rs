//! GPU device + surface management.
//!
//! This module is responsible for:
//! - negotiating the wgpu Adapter/Device/Queue (blocking, startup only)
//! - committing the surface format and (re)configuring the Surface
//! - bracketing device work in validation error scopes

mod context;
mod diagnostics;
mod error;
pub mod error_scope;
mod init;
pub mod negotiate;
mod surface;

pub use context::GpuContext;
pub use error::SurfaceErrorAction;
pub use error_scope::{ErrorScope, ErrorScopes};
pub use init::GpuInit;
pub use surface::SurfaceSize;

pub(crate) use surface::surface_error_action;

#[cfg(test)]
pub(crate) use context::tests::headless_test_context;
