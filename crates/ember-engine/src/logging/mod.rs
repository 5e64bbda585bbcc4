//! Logging utilities.
//!
//! This module centralizes logger initialization. Everything else in the crate
//! (and wgpu itself) reports through the `log` facade, so the filter configured
//! here also decides which backend messages reach the terminal.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
