//! Foundation types for cmdr.
//!
//! This crate holds the pieces shared by every cmdr crate: the error type and
//! the interpreter configuration (markers, port settings, lock and output
//! formatting), loadable from TOML.

pub mod config;
pub mod error;

pub use config::{CommanderConfig, FormatConfig, LockConfig, PortSettings};
pub use error::{CmdrError, Result};
