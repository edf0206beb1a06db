//! Uniform response envelope and error-to-status mapping.
//!
//! Every response body is `{success, message, data}`. Business-rule
//! rejections map to 400, unknown ids to 404, and anything unexpected to a
//! generic 500 that leaks no internals.

use crate::domain::errors::{ClinopsError, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// The wire envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Response {
        envelope(StatusCode::OK, message.into(), Some(data))
    }

    /// 201 with the created payload.
    pub fn created(message: impl Into<String>, data: T) -> Response {
        envelope(StatusCode::CREATED, message.into(), Some(data))
    }
}

impl ApiResponse<()> {
    /// 200 with no payload (cancellations and the like).
    pub fn message(message: impl Into<String>) -> Response {
        envelope::<()>(StatusCode::OK, message.into(), None)
    }
}

fn envelope<T: Serialize>(status: StatusCode, message: String, data: Option<T>) -> Response {
    let body = ApiResponse {
        success: status.is_success(),
        message,
        data,
    };
    (status, Json(body)).into_response()
}

/// Error wrapper that renders the envelope with the right status code.
///
/// Handlers return `Result<Response, ApiError>` so `?` on any engine call
/// produces the mapped failure response.
#[derive(Debug)]
pub struct ApiError(pub ClinopsError);

impl From<ClinopsError> for ApiError {
    fn from(err: ClinopsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.kind() {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, self.0.to_string()),
            ErrorKind::BusinessRule => (StatusCode::BAD_REQUEST, self.0.to_string()),
            ErrorKind::Upstream | ErrorKind::Internal => {
                tracing::error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        envelope::<()>(status, message, None)
    }
}

/// Handler result alias.
pub type ApiResult = std::result::Result<Response, ApiError>;
