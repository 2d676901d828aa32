//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;
use tokio::task::JoinError;
use tracing::error;
use wordsprout_core::CoreError;

/// An error rendered as `{"error": "..."}` with a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub(crate) fn from_join(err: JoinError) -> Self {
        error!(error = %err, "blocking task failed");
        Self::internal()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => Self::bad_request(msg),
            CoreError::Unauthorized(msg) => Self::unauthorized(msg),
            CoreError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            CoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            CoreError::Credentials(msg) => {
                error!(error = %msg, "password hashing failed");
                Self::internal()
            }
            CoreError::Store(e) => {
                error!(error = %e, "store failure");
                Self::internal()
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordsprout_core::StoreError;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ApiError::from(CoreError::Store(StoreError::Poisoned("memory store")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("memory"));
    }
}
