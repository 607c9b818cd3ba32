//! Per-field validation state
//!
//! [`ValidationState`] is the validator's externally observable output. A
//! field that is absent, or whose value is empty, is always reported as
//! [`FieldValidationState::idle`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validation record for a single field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidationState {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_validating: bool,
}

impl FieldValidationState {
    /// Not valid, no error, not validating
    pub fn idle() -> Self {
        Self::default()
    }

    /// Waiting for a debounced pass
    pub fn validating() -> Self {
        Self {
            is_validating: true,
            ..Self::default()
        }
    }

    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
            is_validating: false,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
            is_validating: false,
        }
    }
}

/// Field name to validation record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationState(BTreeMap<String, FieldValidationState>);

impl ValidationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full record for a field; idle when unknown
    pub fn field(&self, field: &str) -> FieldValidationState {
        self.0.get(field).cloned().unwrap_or_default()
    }

    pub fn is_valid(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|s| s.is_valid)
    }

    pub fn is_validating(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|s| s.is_validating)
    }

    /// Error message; `None` when the field is unknown or valid
    pub fn error(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .filter(|s| !s.is_valid)
            .and_then(|s| s.error.as_deref())
    }

    /// Any field still waiting on a pass
    pub fn any_validating(&self) -> bool {
        self.0.values().any(|s| s.is_validating)
    }

    /// Replace a field's record, returning whether it changed
    pub(crate) fn set(&mut self, field: &str, state: FieldValidationState) -> bool {
        match self.0.get_mut(field) {
            Some(current) if *current == state => false,
            Some(current) => {
                *current = state;
                true
            }
            None => {
                self.0.insert(field.to_string(), state);
                true
            }
        }
    }

    /// Forget a field, returning whether it had a record
    pub(crate) fn remove(&mut self, field: &str) -> bool {
        self.0.remove(field).is_some()
    }

    /// Set the validating flag on a field, keeping its last result visible
    pub(crate) fn start_validating(&mut self, field: &str) -> bool {
        let current = self.0.entry(field.to_string()).or_default();
        if current.is_validating {
            return false;
        }
        current.is_validating = true;
        true
    }

    /// Clear the validating flag on a field, returning whether it changed
    pub(crate) fn stop_validating(&mut self, field: &str) -> bool {
        match self.0.get_mut(field) {
            Some(current) if current.is_validating => {
                current.is_validating = false;
                true
            }
            _ => false,
        }
    }

    /// Clear the validating flag on every field
    pub(crate) fn stop_all(&mut self) -> bool {
        let mut changed = false;
        for state in self.0.values_mut() {
            if state.is_validating {
                state.is_validating = false;
                changed = true;
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValidationState)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_defaults() {
        let state = ValidationState::new();
        assert_eq!(state.field("email"), FieldValidationState::idle());
        assert!(!state.is_valid("email"));
        assert!(!state.is_validating("email"));
        assert!(state.error("email").is_none());
    }

    #[test]
    fn test_set_reports_changes() {
        let mut state = ValidationState::new();
        assert!(state.set("email", FieldValidationState::validating()));
        assert!(!state.set("email", FieldValidationState::validating()));
        assert!(state.any_validating());
        assert!(state.set("email", FieldValidationState::invalid("Invalid email address")));
        assert_eq!(state.error("email"), Some("Invalid email address"));
        assert!(!state.any_validating());
    }

    #[test]
    fn test_start_validating_keeps_last_result() {
        let mut state = ValidationState::new();
        state.set("email", FieldValidationState::invalid("Invalid email address"));
        assert!(state.start_validating("email"));
        assert!(!state.start_validating("email"));
        assert_eq!(
            state.field("email"),
            FieldValidationState {
                is_valid: false,
                error: Some("Invalid email address".to_string()),
                is_validating: true,
            }
        );
    }

    #[test]
    fn test_stop_validating_is_idempotent() {
        let mut state = ValidationState::new();
        state.set("name", FieldValidationState::validating());
        assert!(state.stop_validating("name"));
        assert!(!state.stop_validating("name"));
        assert!(!state.stop_validating("unknown"));
        assert!(!state.stop_all());
    }

    #[test]
    fn test_serializes_in_camel_case() {
        let json = serde_json::to_value(FieldValidationState::invalid("Too short")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"isValid": false, "error": "Too short", "isValidating": false})
        );
    }
}
