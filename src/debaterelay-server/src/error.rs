//! Mapping from pipeline failures to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use debaterelay_core::DebateError;
use serde_json::json;

/// A failed request, rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<DebateError> for ApiError {
    fn from(err: DebateError) -> Self {
        let status = match &err {
            DebateError::Decode(_) | DebateError::BlockedContent { .. } => StatusCode::BAD_REQUEST,
            DebateError::NotFound(_) => StatusCode::NOT_FOUND,
            DebateError::Synthesis { status, .. } => synthesis_status(*status),
            DebateError::Generation(_) | DebateError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// Mirror upstream 5xx and 429 responses. Any other provider rejection means
/// this service's own request or credentials were refused, so it stays a 500.
fn synthesis_status(provider_status: Option<u16>) -> StatusCode {
    provider_status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|code| code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
