//! Submission value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Draft-capable form kinds of the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    /// Employer job listing form
    JobListing,
    /// Talent profile form
    TalentProfile,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::JobListing => "job_listing",
            FormKind::TalentProfile => "talent_profile",
        }
    }

    /// Draft key for this form: `{form_kind}` for new entities,
    /// `{form_kind}_{entity_id}` when editing an existing one.
    pub fn draft_key(&self, entity_id: Option<i64>) -> String {
        match entity_id {
            Some(id) => format!("{}_{}", self.as_str(), id),
            None => self.as_str().to_string(),
        }
    }
}

impl FromStr for FormKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_listing" => Ok(FormKind::JobListing),
            "talent_profile" => Ok(FormKind::TalentProfile),
            _ => Err(format!("Unknown form kind: {}", s)),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single local validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{} is required", field);
        Self { field, message }
    }
}

/// Acknowledgment returned by the submission sink
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmissionReceipt {
    /// Identifier assigned to the accepted submission
    pub submission_id: Uuid,
    /// Receipt status, currently always "accepted"
    #[schema(example = "accepted")]
    pub status: String,
}

impl SubmissionReceipt {
    pub fn accepted() -> Self {
        Self {
            submission_id: Uuid::new_v4(),
            status: "accepted".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_kind_round_trips_through_str() {
        for kind in [FormKind::JobListing, FormKind::TalentProfile] {
            let parsed: FormKind = kind.as_str().parse().expect("kind should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn draft_key_includes_entity_when_editing() {
        assert_eq!(FormKind::JobListing.draft_key(None), "job_listing");
        assert_eq!(FormKind::JobListing.draft_key(Some(42)), "job_listing_42");
        assert_eq!(
            FormKind::TalentProfile.draft_key(Some(7)),
            "talent_profile_7"
        );
    }

    #[test]
    fn unknown_form_kind_is_rejected() {
        assert!(FormKind::from_str("resume").is_err());
    }
}
