//! Error type for message generation.

use protofuzz_core::ConfigError;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Serializing a payload failed
    #[error("Failed to encode message: {0}")]
    Encode(#[from] protobuf::Error),

    /// A field the encoder cannot write
    #[error("Cannot encode field {field}: {reason}")]
    UnsupportedField { field: String, reason: String },

    /// A non-empty path segment could not be drawn
    #[error("Field path segment still empty after {attempts} attempts")]
    SegmentRetriesExhausted { attempts: usize },

    /// The requested message type is not in the schema
    #[error("Unknown message type: {0}")]
    MessageTypeNotFound(String),

    /// The target message does not match the generator's descriptor
    #[error("Expected message of type {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
