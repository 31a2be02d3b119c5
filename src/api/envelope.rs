//! Response envelope shared by every API endpoint.
//!
//! Success is `{ "data": T, "meta": {..} }`, failure is
//! `{ "error": { "code", "message" }, "meta": {..} }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::llm::CompletionError;
use crate::session::SessionError;

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::default(),
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    /// The action was cancelled, usually superseded by a newer one.
    pub fn cancelled(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::CONFLICT, "CANCELLED", msg)
    }

    /// The LLM motor answered with an error or could not be reached.
    pub fn remote(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_GATEWAY, "REMOTE_ERROR", msg)
    }
}

impl From<CompletionError> for Response {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Cancelled => ApiErrorResponse::cancelled(err.to_string()),
            CompletionError::Remote { .. } => ApiErrorResponse::remote(err.to_string()),
        }
    }
}

impl From<SessionError> for Response {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Completion(e) => e.into(),
            other => ApiErrorResponse::bad_request(other.to_string()),
        }
    }
}
