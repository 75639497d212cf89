//! Mapping of domain errors onto HTTP responses
//!
//! Every handler returns `ApiError` on failure; this is the only place where
//! error kinds become status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};
use vidstream_core::{AccountError, CatalogError, StreamingError};

/// Failure returned by any API handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unknown video or missing file
    #[error("{0}")]
    NotFound(String),

    /// Malformed input, including unsatisfiable Range headers
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid access token, or failed login
    #[error("{0}")]
    Unauthorized(String),

    /// Request understood but refused, e.g. a taken username
    #[error("{0}")]
    Forbidden(String),

    /// Unexpected server-side failure; the detail is logged, not returned
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Unsatisfiable ranges are reported as 400 rather than 416; clients
            // of this API rely on it.
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StreamingError> for ApiError {
    fn from(error: StreamingError) -> Self {
        match error {
            StreamingError::VideoNotFound { .. } | StreamingError::FileNotFound { .. } => {
                ApiError::NotFound("Video not found".to_string())
            }
            StreamingError::BadRange { source } => ApiError::BadRequest(source.to_string()),
            StreamingError::Io { .. } => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound { .. } => ApiError::NotFound("Video not found".to_string()),
            CatalogError::Validation { .. } => ApiError::BadRequest(error.to_string()),
            CatalogError::Io { .. } => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::UsernameTaken { .. } => ApiError::Forbidden(error.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(error.to_string()),
            AccountError::Validation { .. } => ApiError::BadRequest(error.to_string()),
            AccountError::Hashing { .. } | AccountError::Token { .. } => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => {
                warn!("Request failed with {}: {}", status, other);
                other.to_string()
            }
        };

        (
            status,
            Json(json!({
                "error": message,
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}
