//! Client protocol - draft persistence and deferred submission
//!
//! The companion library the marketplace front end drives: a TTL-bound
//! draft store over a browser-durable storage port, and the orchestrator
//! that carries a form through "fill, save, authenticate, resume, submit"
//! without losing data across the sign-in detour.
//!
//! Everything here runs in a single browser context; cross-tab
//! coordination is out of scope and last-write-wins.

pub mod draft_store;
pub mod orchestrator;
pub mod storage;

pub use draft_store::{DEFAULT_TTL_MINUTES, DraftStore, DraftStoreError};
pub use orchestrator::{
    AutosaveHandle, ResumeFlow, SessionSnapshot, SubmissionIntent, SubmissionOrchestrator,
    SubmissionState, SubmitError, SubmitFlow, SubmitTransport, parse_resume_marker, resume_marker,
};
pub use storage::{DraftStorage, MemoryStorage, StorageError};
