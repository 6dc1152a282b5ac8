//! In-memory submission sink
//!
//! Default sink wired by the gateway binary. Real deployments compose a
//! business sink behind `ISubmissionSink`; this one records accepted
//! submissions so the gateway runs standalone and tests can inspect what
//! got through the gate.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::domain::auth::Claim;
use crate::domain::submission::{FormKind, ISubmissionSink, SubmissionError, SubmissionReceipt};

/// A submission accepted by the in-memory sink
#[derive(Debug, Clone)]
pub struct AcceptedSubmission {
    pub form_kind: FormKind,
    pub entity_id: Option<i64>,
    pub subject: String,
    pub payload: serde_json::Value,
}

/// Sink that records accepted submissions in memory
#[derive(Default)]
pub struct InMemorySink {
    accepted: Mutex<Vec<AcceptedSubmission>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything accepted so far
    pub fn accepted(&self) -> Vec<AcceptedSubmission> {
        self.accepted
            .lock()
            .map(|accepted| accepted.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ISubmissionSink for InMemorySink {
    async fn accept(
        &self,
        form_kind: FormKind,
        entity_id: Option<i64>,
        claim: &Claim,
        payload: serde_json::Value,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut accepted = self
            .accepted
            .lock()
            .map_err(|_| SubmissionError::unavailable("sink lock poisoned"))?;

        accepted.push(AcceptedSubmission {
            form_kind,
            entity_id,
            subject: claim.subject.clone(),
            payload,
        });

        let receipt = SubmissionReceipt::accepted();
        info!(
            form = form_kind.as_str(),
            subject = %claim.subject,
            submission_id = %receipt.submission_id,
            "Accepted submission"
        );
        Ok(receipt)
    }
}
