//! Error types for melodia-api
//!
//! Every handler returns [`ApiResult`]. Errors render as
//! `{"error": "<message>"}` with the matching status code; server-side
//! failures add a `"details"` field.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid session (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Operation not allowed on this resource (403)
    #[error("{0}")]
    Forbidden(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Request body rejected before reaching the handler (400, 413, 415, 422)
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// melodia-common error
    #[error(transparent)]
    Common(#[from] melodia_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use melodia_common::Error as CommonError;

        let (status, message, details) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Rejected { status, message } => (status, message, None),
            ApiError::Common(CommonError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Common(CommonError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            ApiError::Common(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        if let Some(details) = &details {
            error!("Request failed: {}", details);
        }

        let body = match details {
            Some(details) => json!({ "error": message, "details": details }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
