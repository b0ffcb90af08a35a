//! Error types for the output backends
use crate::hue::HueError;
use beatlight_core::{CoreError, SinkError};
use thiserror::Error;

/// Backend errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Hue bridge error
    #[error("Hue error: {0}")]
    Hue(#[from] HueError),

    /// LED strip transport error
    #[error("Strip error: {0}")]
    Strip(String),

    /// Output sink error
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Core pipeline error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, ControlError>;
