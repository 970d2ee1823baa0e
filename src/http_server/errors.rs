//! HTTP error mapping
//!
//! Every error response has the body `{"success": false, "error": "..."}`.
//! Internal failures are logged with full detail and answered with a fixed
//! message so nothing about the cause reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};
use crate::pipeline::PipelineError;

/// Body text of every 500 response
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can answer with
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Invalid input
    #[error("{0}")]
    BadRequest(String),

    /// Unknown resource or route
    #[error("{0}")]
    NotFound(String),

    /// Request body over the configured limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Turned away by the admission gate
    #[error("{0}")]
    TooManyRequests(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Anything unclassified. The detail is logged, never sent.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the response body
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Invalid(violations) => ApiError::BadRequest(violations.to_string()),
            PipelineError::NotFound => ApiError::NotFound(PipelineError::NotFound.to_string()),
            PipelineError::Storage(storage) => ApiError::Internal(storage.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            log_event_with_fields(Event::RequestFailed, &[("detail", detail.as_str())]);
        }

        let body = ErrorBody {
            success: false,
            error: self.client_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
