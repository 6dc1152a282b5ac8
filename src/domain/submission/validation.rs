//! Local field validation
//!
//! The orchestrator runs this before any network call; a non-empty result
//! keeps the flow in the editing state.

use serde_json::Value;

use super::value_objects::FieldError;

/// Validates a form payload locally. Returns one error per offending field;
/// an empty vector means the payload may be submitted.
pub trait FormValidator: Send + Sync {
    fn validate(&self, payload: &Value) -> Vec<FieldError>;
}

/// Validator requiring a set of fields to be present and non-blank.
///
/// Non-string values (numbers, arrays, objects) count as present; strings
/// must contain at least one non-whitespace character.
#[derive(Debug, Clone, Default)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl FormValidator for RequiredFields {
    fn validate(&self, payload: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for field in &self.fields {
            match payload.get(field) {
                None | Some(Value::Null) => errors.push(FieldError::required(field)),
                Some(Value::String(s)) if s.trim().is_empty() => {
                    errors.push(FieldError::required(field));
                }
                Some(_) => {}
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn passes_when_required_fields_are_filled() {
        let validator = RequiredFields::new(["title", "description"]);
        let payload = json!({"title": "Backend engineer", "description": "Remote", "extra": 1});
        assert!(validator.validate(&payload).is_empty());
    }

    #[test]
    fn flags_missing_and_blank_fields() {
        let validator = RequiredFields::new(["title", "description"]);
        let payload = json!({"title": "   "});
        let errors = validator.validate(&payload);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], FieldError::required("title"));
        assert_eq!(errors[1], FieldError::required("description"));
    }

    #[test]
    fn non_string_values_count_as_present() {
        let validator = RequiredFields::new(["salary"]);
        assert!(validator.validate(&json!({"salary": 90_000})).is_empty());
    }
}
