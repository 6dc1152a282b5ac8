//! Submission domain errors

use thiserror::Error;

use super::value_objects::FieldError;

/// Errors produced by the submission sink
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// The sink rejected the payload after server-side validation
    #[error("Submission payload failed validation")]
    Invalid { errors: Vec<FieldError> },

    /// The sink could not take the submission right now; safe to retry
    #[error("Submission sink unavailable: {message}")]
    Unavailable { message: String },
}

impl SubmissionError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
