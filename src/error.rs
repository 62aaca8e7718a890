//! Error types for the tabclass crate

use thiserror::Error;

/// Result type alias for tabclass operations
pub type Result<T> = std::result::Result<T, TabClassError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum TabClassError {
    #[error("Target column not found in dataset.")]
    InvalidTargetColumn(String),

    #[error("Unsupported problem type: {0}")]
    UnsupportedProblemType(String),

    #[error("Upload exceeds the configured size limit of {limit} bytes")]
    UploadTooLarge { limit: usize },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for TabClassError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabClassError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabClassError {
    fn from(err: serde_json::Error) -> Self {
        TabClassError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TabClassError {
    fn from(err: ndarray::ShapeError) -> Self {
        TabClassError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
