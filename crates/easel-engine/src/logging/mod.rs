//! Logging utilities.
//!
//! Everything in the crate logs through the `log` facade. This module only
//! offers a one-shot `env_logger` setup for hosts that do not install their own.

mod init;

pub use init::{init_logging, LoggingConfig};
