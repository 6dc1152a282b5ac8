//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard error response envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "RATE_LIMITED")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Too many requests, slow down.")]
    pub message: String,

    /// Additional error context
    #[schema(example = r#"{"retry_after": 42}"#)]
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    pub request_id: Uuid,

    /// Error occurrence timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// CSRF token issued to the client.
///
/// The field name is camelCase by the public contract; clients echo the
/// token back in the `x-csrf-token` header on state-changing calls.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    #[schema(example = "3q2-9snP0uRbuw.Yk1fQX84…")]
    pub csrf_token: String,
}

/// Acknowledgment for a save-only submission call
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DraftAckResponse {
    /// Always "draft-acknowledged"
    #[schema(example = "draft-acknowledged")]
    pub status: String,

    /// The draft key the client persisted under
    #[schema(example = "job_listing_42")]
    pub draft_key: String,
}

impl DraftAckResponse {
    pub fn new(draft_key: String) -> Self {
        Self {
            status: "draft-acknowledged".to_string(),
            draft_key,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.3.0")]
    pub version: String,

    /// Health check timestamp
    pub timestamp: DateTime<Utc>,
}
