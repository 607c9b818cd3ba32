//! Schema collaborator and declarative form schemas
//!
//! A [`Schema`] validates a whole [`FieldValues`] snapshot at once and
//! reports either success or an ordered list of path-scoped issues. The
//! debounced validator only depends on this trait; [`FormSchema`] is the
//! declarative implementation used by the dashboard forms.
//!
//! An `Err` returned from [`Schema::validate`] is an evaluation fault, not a
//! field failure. Field failures are [`SchemaOutcome::Invalid`].

pub mod form;
pub mod rules;

pub use form::{FieldDefinition, FormSchema, SchemaDefinition};
pub use rules::FieldRule;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::values::FieldValues;

/// A single schema failure scoped to a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Path segments; the first segment is the field name
    pub path: Vec<String>,
    /// Human-readable message
    pub message: String,
    /// Identifier of the rule that failed, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl SchemaIssue {
    /// Create an issue targeting a single field
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![field.into()],
            message: message.into(),
            code: None,
        }
    }

    /// Create an issue with an explicit multi-segment path
    pub fn at_path<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
            code: None,
        }
    }

    /// Attach the failing rule's code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this issue is reported against `field`
    pub fn targets(&self, field: &str) -> bool {
        self.path.first().map(String::as_str) == Some(field)
    }

    /// Dotted form of the path (`address.city`)
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.message)
    }
}

/// Result of evaluating a schema against a full snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "issues", rename_all = "snake_case")]
pub enum SchemaOutcome {
    Valid,
    Invalid(Vec<SchemaIssue>),
}

impl SchemaOutcome {
    /// `Valid` when there are no issues, `Invalid` otherwise
    pub fn from_issues(issues: Vec<SchemaIssue>) -> Self {
        if issues.is_empty() {
            SchemaOutcome::Valid
        } else {
            SchemaOutcome::Invalid(issues)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SchemaOutcome::Valid)
    }

    /// All issues, empty when valid
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            SchemaOutcome::Valid => &[],
            SchemaOutcome::Invalid(issues) => issues,
        }
    }

    /// First issue whose path targets `field`
    pub fn first_issue_for(&self, field: &str) -> Option<&SchemaIssue> {
        self.issues().iter().find(|issue| issue.targets(field))
    }
}

/// Declarative validity constraints over a full snapshot
///
/// Implementations must be pure: the same snapshot always yields the same
/// outcome and evaluation has no side effects.
pub trait Schema: Send + Sync {
    /// Evaluate the schema against the full snapshot
    fn validate(&self, values: &FieldValues) -> Result<SchemaOutcome>;

    /// Name used in logs and metric labels
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> Schema for F
where
    F: Fn(&FieldValues) -> Result<SchemaOutcome> + Send + Sync,
{
    fn validate(&self, values: &FieldValues) -> Result<SchemaOutcome> {
        self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_targets_first_segment_only() {
        let issue = SchemaIssue::at_path(["address", "city"], "City is required");
        assert!(issue.targets("address"));
        assert!(!issue.targets("city"));
        assert_eq!(issue.path_string(), "address.city");
        assert_eq!(issue.to_string(), "address.city: City is required");
    }

    #[test]
    fn test_outcome_first_issue_for() {
        let outcome = SchemaOutcome::from_issues(vec![
            SchemaIssue::new("password", "Too short"),
            SchemaIssue::new("password", "Needs a digit"),
            SchemaIssue::new("email", "Invalid email address"),
        ]);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.first_issue_for("password").unwrap().message, "Too short");
        assert!(outcome.first_issue_for("name").is_none());
        assert!(SchemaOutcome::from_issues(Vec::new()).is_valid());
    }

    #[test]
    fn test_closure_schema() {
        let schema = |values: &FieldValues| -> Result<SchemaOutcome> {
            Ok(if values.is_empty_field("name") {
                SchemaOutcome::Invalid(vec![SchemaIssue::new("name", "Required")])
            } else {
                SchemaOutcome::Valid
            })
        };
        assert!(!schema.validate(&FieldValues::new()).unwrap().is_valid());
        assert!(schema
            .validate(&FieldValues::new().with("name", "Ann"))
            .unwrap()
            .is_valid());
    }
}
