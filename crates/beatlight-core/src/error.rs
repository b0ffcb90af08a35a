//! Error types for the core pipeline
use crate::metadata::base64::DecodeError;
use crate::sink::SinkError;
use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Metadata stream error
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Output sink error
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Metadata stream errors.
///
/// Only [`MetadataError::Io`] ends a stream; every other variant describes
/// a record that was discarded or accepted with a warning.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Transport failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record header: {0:?}")]
    MalformedHeader(String),

    #[error("Data tag not seen, {0:?} seen instead")]
    MissingDataTag(String),

    #[error("Payload block truncated after {found} of {expected} symbols")]
    TruncatedPayload { expected: usize, found: usize },

    #[error("Declared payload of {declared} bytes exceeds {max} byte limit")]
    RecordTooLarge { declared: usize, max: usize },

    #[error("Payload decoded to {decoded} bytes, header declared {declared}")]
    LengthMismatch { declared: usize, decoded: usize },

    #[error("Payload decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
