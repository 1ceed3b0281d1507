//! Logging utilities.
//!
//! Centralizes logger initialization. Everything else in the crate talks to
//! the `log` facade only; GPU diagnostics, shader build logs and resource
//! failures are all reported through it.

mod init;

pub use init::{init_logging, LoggingConfig};
