//! Error types for the property estimator

use thiserror::Error;

/// Result type alias for estimator operations
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Main error type for training, persistence and prediction
#[derive(Error, Debug)]
pub enum EstimatorError {
    /// A required column is missing, unexpected, or has the wrong type
    #[error("Schema error in column '{column}': {reason}")]
    Schema { column: String, reason: String },

    /// Values are missing, non-numeric, or the table is empty
    #[error("Data error: {0}")]
    Data(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prediction store error: {0}")]
    Store(String),
}

impl EstimatorError {
    pub fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimatorError::Schema {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Errors caused by the caller's input rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EstimatorError::Schema { .. } | EstimatorError::Data(_) | EstimatorError::Shape { .. }
        )
    }
}

impl From<polars::error::PolarsError> for EstimatorError {
    fn from(err: polars::error::PolarsError) -> Self {
        EstimatorError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for EstimatorError {
    fn from(err: serde_json::Error) -> Self {
        EstimatorError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for EstimatorError {
    fn from(err: bincode::Error) -> Self {
        EstimatorError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for EstimatorError {
    fn from(err: ndarray::ShapeError) -> Self {
        EstimatorError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
