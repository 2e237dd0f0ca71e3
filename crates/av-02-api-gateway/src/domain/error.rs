//! API Gateway error types.

use super::types::ResponseBody;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Message for every authorization failure on asset endpoints.
pub const UNAUTHORIZED: &str = "unauthorized";
/// Message for rejected credentials.
pub const INVALID_CREDENTIALS: &str = "invalid login/password";
/// Message for a missing asset or unknown route.
pub const NOT_FOUND: &str = "not found";

/// An error response: HTTP status plus `{"error": message}`.
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

    /// 400, malformed client input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 for asset endpoints.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED)
    }

    /// 401 for the auth endpoint.
    pub fn invalid_credentials() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("asset exceeds {} bytes", limit),
        )
    }

    /// 500, backend failure. The detail is surfaced to the caller.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ResponseBody::error(self.message))).into_response()
    }
}

// Extractor rejections keep axum's status and text but use the JSON envelope.
impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(#[source] std::io::Error),

    /// Serving failed after bind
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The server task panicked or was cancelled
    #[error("server task failed: {0}")]
    Task(String),
}
