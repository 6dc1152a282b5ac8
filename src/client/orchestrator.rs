//! Deferred-submission orchestrator
//!
//! State machine carrying one pending form submission through
//! `fill -> save -> authenticate -> resume -> submit`. An unauthenticated
//! submit parks the payload in the draft store and hands back a sign-in
//! URL with a resume marker; after the detour, `resume` restores the draft
//! and submits it without asking the visitor to re-enter anything.
//!
//! One orchestrator instance per form per browser context; the autosave
//! task shares it through an `Arc`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::draft_store::{DEFAULT_TTL_MINUTES, DraftStore};
use crate::domain::auth::Role;
use crate::domain::submission::{FieldError, FormKind, FormValidator, SubmissionReceipt};
use crate::presentation::gate::sign_in_location;

/// Default autosave period
pub const DEFAULT_AUTOSAVE_PERIOD: Duration = Duration::from_secs(10);

/// Where a pending submission currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Editing,
    ValidatingLocally,
    DraftSaved,
    Redirected,
    Resumed,
    Submitting,
    Succeeded,
    Failed,
}

/// The pending work item: which form, which entity, and where the flow is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionIntent {
    pub form_kind: FormKind,
    pub entity_id: Option<i64>,
    pub state: SubmissionState,
}

/// The client's view of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub subject: String,
    pub role: Role,
}

impl SessionSnapshot {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}

/// Client-side error taxonomy, mirroring the server's wire codes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("CSRF token was rejected")]
    CsrfRejected,

    #[error("no authenticated session")]
    Unauthenticated,

    #[error("session role is not allowed to submit this form")]
    ForbiddenRole,

    #[error("payload failed server-side validation")]
    Validation,

    #[error("transient submit failure: {0}")]
    Transient(String),
}

/// Network port the orchestrator submits through
#[async_trait]
pub trait SubmitTransport: Send + Sync {
    /// Fetch a fresh CSRF token from the token-issuing endpoint
    async fn fetch_csrf_token(&self) -> Result<String, SubmitError>;

    /// Perform the protected submit call
    async fn submit(
        &self,
        form_kind: FormKind,
        entity_id: Option<i64>,
        payload: &Value,
        csrf_token: &str,
    ) -> Result<SubmissionReceipt, SubmitError>;

    /// Fire the save-only acknowledgment; best-effort, needs neither a
    /// session nor a CSRF token
    async fn acknowledge_draft(
        &self,
        form_kind: FormKind,
        entity_id: Option<i64>,
    ) -> Result<(), SubmitError>;
}

/// Outcome of a submit attempt
#[derive(Debug)]
pub enum SubmitFlow {
    /// Local validation failed; back to editing, nothing left the client
    Invalid(Vec<FieldError>),
    /// Draft saved; navigate to sign-in and come back via the resume marker
    RedirectToSignIn { sign_in_url: String },
    Submitted(SubmissionReceipt),
    /// Submit failed; the draft is retained so a retry loses nothing
    Rejected(SubmitError),
}

/// Outcome of a resume attempt
#[derive(Debug)]
pub enum ResumeFlow {
    /// No draft under the intent's key; every page load may probe this
    NothingPending,
    Submitted(SubmissionReceipt),
    Rejected(SubmitError),
}

/// Resume marker query pair appended to the form's return path
pub fn resume_marker(draft_key: &str) -> String {
    format!("resume={}", draft_key)
}

/// Extract the draft key from a query string carrying a resume marker
pub fn parse_resume_marker(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("resume=").map(|key| key.to_string()))
}

/// Orchestrator for one pending form submission
pub struct SubmissionOrchestrator {
    intent: Mutex<SubmissionIntent>,
    payload: Mutex<Value>,
    drafts: Arc<DraftStore>,
    validator: Arc<dyn FormValidator>,
    transport: Arc<dyn SubmitTransport>,
    /// Path of the form page, used as the sign-in return target
    return_path: String,
}

impl SubmissionOrchestrator {
    pub fn new(
        form_kind: FormKind,
        entity_id: Option<i64>,
        return_path: impl Into<String>,
        drafts: Arc<DraftStore>,
        validator: Arc<dyn FormValidator>,
        transport: Arc<dyn SubmitTransport>,
    ) -> Self {
        Self {
            intent: Mutex::new(SubmissionIntent {
                form_kind,
                entity_id,
                state: SubmissionState::Editing,
            }),
            payload: Mutex::new(Value::Null),
            drafts,
            validator,
            transport,
            return_path: return_path.into(),
        }
    }

    /// Snapshot of the pending intent
    pub fn intent(&self) -> SubmissionIntent {
        self.intent.lock().map(|intent| *intent).unwrap_or(SubmissionIntent {
            form_kind: FormKind::JobListing,
            entity_id: None,
            state: SubmissionState::Failed,
        })
    }

    pub fn state(&self) -> SubmissionState {
        self.intent().state
    }

    fn set_state(&self, state: SubmissionState) {
        if let Ok(mut intent) = self.intent.lock() {
            intent.state = state;
        }
    }

    /// Draft key for this intent
    pub fn draft_key(&self) -> String {
        let intent = self.intent();
        intent.form_kind.draft_key(intent.entity_id)
    }

    /// Replace the live form payload (called by the form binding on edit)
    pub fn set_payload(&self, payload: Value) {
        if let Ok(mut current) = self.payload.lock() {
            *current = payload;
        }
    }

    /// Current live payload
    pub fn payload(&self) -> Value {
        self.payload
            .lock()
            .map(|payload| payload.clone())
            .unwrap_or(Value::Null)
    }

    /// Sign-in URL carrying the return path plus the resume marker
    fn sign_in_url(&self, draft_key: &str) -> String {
        let separator = if self.return_path.contains('?') { '&' } else { '?' };
        let return_target = format!("{}{}{}", self.return_path, separator, resume_marker(draft_key));
        sign_in_location(&return_target)
    }

    /// Submit the live payload.
    ///
    /// Validation failures never reach the network. Without a session the
    /// payload is parked as a draft and the caller gets a sign-in URL;
    /// with one, the protected submit runs directly.
    pub async fn submit(&self, session: Option<&SessionSnapshot>) -> SubmitFlow {
        self.set_state(SubmissionState::ValidatingLocally);
        let payload = self.payload();

        let errors = self.validator.validate(&payload);
        if !errors.is_empty() {
            self.set_state(SubmissionState::Editing);
            return SubmitFlow::Invalid(errors);
        }

        match session {
            None => {
                let intent = self.intent();
                let draft_key = self.draft_key();

                if let Err(e) = self.drafts.save(&draft_key, &payload, DEFAULT_TTL_MINUTES) {
                    // Redirecting without a saved draft would lose the form.
                    warn!(error = %e, draft_key = %draft_key, "Could not save draft before redirect");
                    self.set_state(SubmissionState::Editing);
                    return SubmitFlow::Rejected(SubmitError::Transient(e.to_string()));
                }
                self.set_state(SubmissionState::DraftSaved);

                if let Err(e) = self
                    .transport
                    .acknowledge_draft(intent.form_kind, intent.entity_id)
                    .await
                {
                    debug!(error = %e, "Save-only acknowledgment failed, continuing");
                }

                self.set_state(SubmissionState::Redirected);
                SubmitFlow::RedirectToSignIn {
                    sign_in_url: self.sign_in_url(&draft_key),
                }
            }
            Some(_) => match self.submit_authenticated(&payload).await {
                Ok(receipt) => SubmitFlow::Submitted(receipt),
                Err(e) => SubmitFlow::Rejected(e),
            },
        }
    }

    /// Resume after the authentication detour.
    ///
    /// Idempotent: with no draft under the intent's key this is a no-op,
    /// never an error and never a duplicate submission.
    pub async fn resume(&self, _session: &SessionSnapshot) -> ResumeFlow {
        let draft_key = self.draft_key();
        let Some(draft) = self.drafts.load(&draft_key) else {
            return ResumeFlow::NothingPending;
        };

        self.set_payload(draft.clone());
        self.set_state(SubmissionState::Resumed);

        match self.submit_authenticated(&draft).await {
            Ok(receipt) => ResumeFlow::Submitted(receipt),
            Err(e) => ResumeFlow::Rejected(e),
        }
    }

    async fn submit_authenticated(&self, payload: &Value) -> Result<SubmissionReceipt, SubmitError> {
        let intent = self.intent();
        self.set_state(SubmissionState::Submitting);

        let csrf_token = match self.transport.fetch_csrf_token().await {
            Ok(token) => token,
            Err(e) => {
                self.set_state(SubmissionState::Failed);
                return Err(e);
            }
        };

        match self
            .transport
            .submit(intent.form_kind, intent.entity_id, payload, &csrf_token)
            .await
        {
            Ok(receipt) => {
                self.set_state(SubmissionState::Succeeded);
                self.drafts.clear(&self.draft_key());
                Ok(receipt)
            }
            Err(e) => {
                // Draft retained so a retry does not lose data.
                self.set_state(SubmissionState::Failed);
                Err(e)
            }
        }
    }

    /// Save the live payload as a draft right now. Empty payloads are
    /// skipped so autosave never clobbers a stored draft with nothing.
    pub fn save_now(&self) {
        let payload = self.payload();
        if payload_is_empty(&payload) {
            return;
        }
        let draft_key = self.draft_key();
        if let Err(e) = self.drafts.save(&draft_key, &payload, DEFAULT_TTL_MINUTES) {
            warn!(error = %e, draft_key = %draft_key, "Autosave failed");
        }
    }

    /// Spawn the periodic autosave task.
    ///
    /// Saves on every tick and performs one final best-effort save when the
    /// handle's token fires, which is the page-unload flush.
    pub fn start_autosave(self: Arc<Self>, period: Duration) -> AutosaveHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.save_now();
                    }
                    _ = task_token.cancelled() => {
                        self.save_now();
                        debug!("Autosave task flushed and stopped");
                        break;
                    }
                }
            }
        });

        AutosaveHandle { token, task }
    }
}

/// Handle to a running autosave task
pub struct AutosaveHandle {
    token: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl AutosaveHandle {
    /// Trigger the final flush without waiting for it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Trigger the final flush and wait for the task to exit
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}

fn payload_is_empty(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_marker_round_trips() {
        let marker = resume_marker("job_listing_42");
        assert_eq!(marker, "resume=job_listing_42");
        assert_eq!(
            parse_resume_marker(&marker),
            Some("job_listing_42".to_string())
        );
    }

    #[test]
    fn resume_marker_parses_among_other_pairs() {
        assert_eq!(
            parse_resume_marker("tab=details&resume=talent_profile&x=1"),
            Some("talent_profile".to_string())
        );
        assert_eq!(parse_resume_marker("tab=details"), None);
        assert_eq!(parse_resume_marker(""), None);
    }

    #[test]
    fn empty_payloads_are_recognized() {
        assert!(payload_is_empty(&Value::Null));
        assert!(payload_is_empty(&serde_json::json!({})));
        assert!(payload_is_empty(&serde_json::json!("  ")));
        assert!(!payload_is_empty(&serde_json::json!({"title": "x"})));
        assert!(!payload_is_empty(&serde_json::json!(0)));
    }
}
