//! Error types for cmdr.

use std::io;

/// Errors produced by the cmdr crates.
///
/// None of these are fatal to a running interpreter: the dispatcher reports
/// them and carries on with the next line.
#[derive(Debug, thiserror::Error)]
pub enum CmdrError {
    #[error("config error: {0}")]
    Config(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("buffer overflow: capacity {capacity} bytes")]
    BufferOverflow { capacity: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CmdrError>;
