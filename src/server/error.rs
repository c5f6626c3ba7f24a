//! Error types for the server

use crate::error::EstimatorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Rejected form submission, answered as plain text
    #[error("{0}")]
    InvalidForm(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::InvalidForm(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Estimator(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ServerError::Estimator(e) => {
                tracing::error!(detail = %e, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let schema = ServerError::from(EstimatorError::schema("price", "column is missing"));
        assert_eq!(schema.into_response().status(), StatusCode::BAD_REQUEST);

        let store = ServerError::from(EstimatorError::Store("disk full".to_string()));
        assert_eq!(store.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let form = ServerError::InvalidForm("Missing required form fields".to_string());
        assert_eq!(form.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
