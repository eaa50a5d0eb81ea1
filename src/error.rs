//! Engine error types with HTTP status code mapping.
//!
//! [`EngineError`] is the central error type for the engine. Every failure is
//! scoped to a single claim key; none halts the service globally. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid submitted net: must not be negative",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`EngineError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Engine-wide error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                |
/// |-----------|-----------------------|----------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request            |
/// | 2000–2999 | Not Found             | 404 Not Found              |
/// | 3000–3999 | Logic / Internal      | 500 Internal Server Error  |
/// | 4000–4999 | Transient             | 503 Service Unavailable    |
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed input rejected before any write (e.g. a negative
    /// submitted net amount).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No claim payment record exists for the given claim key.
    #[error("claim not found: {0}")]
    ClaimNotFound(String),

    /// A computed batch violated an invariant after clamping. This
    /// indicates a logic defect rather than bad data; the recomputation is
    /// aborted and the prior summary left unchanged.
    #[error("consistency violation for claim {claim_key}: {detail}")]
    Consistency {
        /// Claim whose recomputation was aborted.
        claim_key: String,
        /// Which invariant was violated.
        detail: String,
    },

    /// Storage I/O failure during a read or merge-write. Retried with
    /// backoff by the dispatcher.
    #[error("storage error: {0}")]
    Storage(String),

    /// The dispatch queue is full and the change notification was not
    /// accepted.
    #[error("dispatch queue full")]
    QueueFull,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::ClaimNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Consistency { .. } => 3001,
            Self::Storage(_) => 4001,
            Self::QueueFull => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ClaimNotFound(_) => StatusCode::NOT_FOUND,
            Self::Consistency { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) | Self::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether retrying the failed operation may succeed without any
    /// change to inputs or state. Drives the dispatcher's retry loop.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::QueueFull)
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = EngineError::Validation("negative net".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert!(!err.is_transient());
    }

    #[test]
    fn storage_and_queue_full_are_transient() {
        assert!(EngineError::Storage("connection reset".to_string()).is_transient());
        assert!(EngineError::QueueFull.is_transient());
        assert!(
            !EngineError::Consistency {
                claim_key: "C-1".to_string(),
                detail: "paid above net".to_string(),
            }
            .is_transient()
        );
    }

    #[test]
    fn consistency_message_names_the_claim() {
        let err = EngineError::Consistency {
            claim_key: "C-42".to_string(),
            detail: "total paid mismatch".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("C-42"));
        assert!(msg.contains("total paid mismatch"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = EngineError::ClaimNotFound("C-9".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }
}
