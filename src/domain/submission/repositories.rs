//! Submission port traits

use async_trait::async_trait;

use super::errors::SubmissionError;
use super::value_objects::{FormKind, SubmissionReceipt};
use crate::domain::auth::Claim;

/// Sink that accepts gated submissions on behalf of an authenticated account.
///
/// Data mapping and persistence live behind this trait; the gateway only
/// guarantees that `claim` passed the route gate and the request carried a
/// valid CSRF token.
#[async_trait]
pub trait ISubmissionSink: Send + Sync {
    /// Accept a submission payload for the given form
    async fn accept(
        &self,
        form_kind: FormKind,
        entity_id: Option<i64>,
        claim: &Claim,
        payload: serde_json::Value,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}
