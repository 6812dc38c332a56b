//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": "<message>"}`. Store and
//! workflow errors, malformed JSON and unparseable path ids are all client
//! errors (`400`); only a failing health probe answers `503`.

use crate::error::Error;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// API HTTP error
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Message rendered under `"error"`
    pub message: String,
}

impl ApiError {
    /// Create new error with HTTP status code
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build Bad Request (400) error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Build Service Unavailable (503) error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
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

/// Convert store and workflow errors to ApiError
impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_transient() {
            warn!("Request failed on a transient error: {}", err);
        } else {
            debug!("Request rejected: {}", err);
        }
        ApiError::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
