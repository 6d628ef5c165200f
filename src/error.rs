//! Error types for the gallery access layer
//!
//! Provides unified error handling using thiserror. Every failure that can
//! cross a layer boundary is a [`GalleryError`]; the cache and coalescer never
//! produce one during normal operation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Gallery Error Enum ==
/// Unified error type for the access layer.
///
/// `Clone` so that a single coalesced outcome can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalleryError {
    /// Upstream rejected the credentials or signature (401/403). Never retried.
    #[error("Authentication rejected by upstream ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Upstream kept answering 429 until the retry budget ran out.
    #[error("Rate limited by upstream after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Connect error, timeout or unreadable response, after retries.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Any other non-success status. Body is truncated for diagnostics.
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The caller's cancellation signal fired.
    #[error("Request cancelled")]
    Cancelled,

    /// The response decoded but did not have the expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A caller-supplied album or image key is not a valid identifier
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GalleryError {
    /// Whether the transport may spend another attempt on this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GalleryError::RateLimited { .. } | GalleryError::Transport(_)
        )
    }

    /// Cancellation is not a failure and should not be logged as one.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, GalleryError::Cancelled)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = match &self {
            GalleryError::Upstream { status: 404, .. } => StatusCode::NOT_FOUND,
            GalleryError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            GalleryError::Authentication { .. }
            | GalleryError::Transport(_)
            | GalleryError::Upstream { .. }
            | GalleryError::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
            GalleryError::RateLimited { .. } | GalleryError::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GalleryError::Config(_) | GalleryError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the access layer.
pub type Result<T> = std::result::Result<T, GalleryError>;
