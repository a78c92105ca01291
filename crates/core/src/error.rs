//! Error types for the macro-charts system.
//!
//! Data-quality problems in source records (missing fields, unparsable numbers,
//! empty series, malformed period labels) are never errors: they become gaps or
//! omitted series. This type covers configuration and structural mistakes only.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the macro-charts system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An array handed to a bundle does not match the category axis.
    #[error("Length mismatch for '{name}': expected {expected} points, got {actual}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Data error (structurally invalid input).
    #[error("Data error: {0}")]
    Data(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Error::LengthMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }
}
