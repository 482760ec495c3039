//! Error types for the storefront cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Api Error Enum ==
/// Unified error type for cached fetches and the gateway.
///
/// Cloneable because a single failed request is observed by every caller
/// that joined it while it was in flight.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Upstream answered with a non-2xx status
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// Network level failure (connect, DNS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body was not valid JSON for the requested type
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Builds an HTTP error from a status code, using the canonical reason phrase.
    pub fn http(status: u16) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        ApiError::Http {
            status,
            status_text,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Http { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Transport(_) | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storefront cache.
pub type Result<T> = std::result::Result<T, ApiError>;
