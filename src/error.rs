//! Error types for the purifai cleaning engine

use thiserror::Error;

/// Result type alias for purifai operations
pub type Result<T> = std::result::Result<T, PurifaiError>;

/// Main error type for the cleaning pipeline
#[derive(Error, Debug)]
pub enum PurifaiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for PurifaiError {
    fn from(err: polars::error::PolarsError) -> Self {
        PurifaiError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PurifaiError {
    fn from(err: serde_json::Error) -> Self {
        PurifaiError::SerializationError(err.to_string())
    }
}
