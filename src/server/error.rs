//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::TabClassError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

impl From<TabClassError> for ServerError {
    fn from(err: TabClassError) -> Self {
        match err {
            TabClassError::InvalidTargetColumn(_) => ServerError::BadRequest(err.to_string()),
            TabClassError::UploadTooLarge { .. } => ServerError::PayloadTooLarge(err.to_string()),
            // Everything else, unsupported problem types included,
            // collapses into a processing failure with the raw message
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "request processing failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_column_maps_to_bad_request() {
        let err: ServerError = TabClassError::InvalidTargetColumn("x".to_string()).into();
        assert!(matches!(err, ServerError::BadRequest(_)));
        assert_eq!(err.to_string(), "Target column not found in dataset.");
    }

    #[test]
    fn test_unsupported_problem_type_maps_to_internal() {
        let err: ServerError =
            TabClassError::UnsupportedProblemType("too many classes".to_string()).into();
        assert!(matches!(err, ServerError::Internal(_)));
    }

    #[test]
    fn test_oversize_maps_to_payload_too_large() {
        let err: ServerError = TabClassError::UploadTooLarge { limit: 5 }.into();
        assert!(matches!(err, ServerError::PayloadTooLarge(_)));
    }
}
