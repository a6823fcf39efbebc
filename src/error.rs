//! Error types for the quantization engine

use thiserror::Error;

/// Main error type for quantization, scoring, and persistence operations
#[derive(Error, Debug)]
pub enum BinquantError {
    /// Vector lengths disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Configuration outside the supported ranges
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// NaN or infinite component in an input vector
    #[error("Invalid component at dimension {dimension}: {value}")]
    InvalidComponent { dimension: usize, value: f32 },

    /// Zero input vectors to a build
    #[error("Cannot quantize an empty vector set")]
    EmptyCorpus,

    /// Out-of-range ordinal passed to a corpus accessor
    #[error("Ordinal {ordinal} out of range for corpus of {size} vectors")]
    InvalidOrdinal { ordinal: usize, size: usize },

    /// Code value outside the range its bit width allows
    #[error("Invalid {bits}-bit code {value} at dimension {dimension}")]
    InvalidCode { bits: u8, value: u8, dimension: usize },

    /// Corrupt or inconsistent persisted data
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BinquantError>;
