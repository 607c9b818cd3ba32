//! Field rules for declarative form schemas
//!
//! Rules are declared as serde-tagged data (`{ rule = "min_length", min = 8 }`)
//! and compiled once into [`CompiledRule`]s so regexes are built up front.
//! Every rule except `required` passes on an empty value; emptiness is the
//! `required` rule's concern.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SchemaIssue;
use crate::error::Result;
use crate::values::{is_empty_value, json_type_name, FieldValues};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Declarative rule attached to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Value must be present and not empty
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Minimum length (characters for text, items for lists)
    MinLength {
        min: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Maximum length (characters for text, items for lists)
    MaxLength {
        max: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Text must match a regular expression
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Text must look like an email address
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Numeric bounds; numeric text is accepted
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must equal one of the allowed values
    OneOf {
        values: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must equal another field's value
    Matches {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl FieldRule {
    pub fn required() -> Self {
        FieldRule::Required { message: None }
    }

    pub fn min_length(min: usize) -> Self {
        FieldRule::MinLength { min, message: None }
    }

    pub fn max_length(max: usize) -> Self {
        FieldRule::MaxLength { max, message: None }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        FieldRule::Pattern {
            pattern: pattern.into(),
            message: None,
        }
    }

    pub fn email() -> Self {
        FieldRule::Email { message: None }
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FieldRule::Range {
            min,
            max,
            message: None,
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FieldRule::OneOf {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    pub fn matches(field: impl Into<String>) -> Self {
        FieldRule::Matches {
            field: field.into(),
            message: None,
        }
    }

    /// Replace the rule's message
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        let slot = match &mut self {
            FieldRule::Required { message }
            | FieldRule::MinLength { message, .. }
            | FieldRule::MaxLength { message, .. }
            | FieldRule::Pattern { message, .. }
            | FieldRule::Email { message }
            | FieldRule::Range { message, .. }
            | FieldRule::OneOf { message, .. }
            | FieldRule::Matches { message, .. } => message,
        };
        *slot = Some(text.into());
        self
    }

    /// Stable rule code used in issues and metrics
    pub fn code(&self) -> &'static str {
        match self {
            FieldRule::Required { .. } => "required",
            FieldRule::MinLength { .. } => "min_length",
            FieldRule::MaxLength { .. } => "max_length",
            FieldRule::Pattern { .. } => "pattern",
            FieldRule::Email { .. } => "email",
            FieldRule::Range { .. } => "range",
            FieldRule::OneOf { .. } => "one_of",
            FieldRule::Matches { .. } => "matches",
        }
    }

    pub(crate) fn compile(&self) -> Result<CompiledRule> {
        let regex = match self {
            FieldRule::Pattern { pattern, .. } => Some(Regex::new(pattern)?),
            FieldRule::Email { .. } => Some(Regex::new(EMAIL_PATTERN)?),
            _ => None,
        };
        Ok(CompiledRule {
            rule: self.clone(),
            regex,
        })
    }
}

/// A rule ready for evaluation
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    rule: FieldRule,
    regex: Option<Regex>,
}

impl CompiledRule {
    pub(crate) fn rule(&self) -> &FieldRule {
        &self.rule
    }

    /// Check `field` in `values`; `None` means the rule passed
    pub(crate) fn check(&self, field: &str, values: &FieldValues) -> Option<SchemaIssue> {
        let value = values.get(field);
        let empty = is_empty_value(value);

        let failure = match &self.rule {
            FieldRule::Required { message } => {
                empty.then(|| pick(message, || format!("{} is required", field)))
            }
            _ if empty => None,
            FieldRule::MinLength { min, message } => match measure(value) {
                Some(len) if len < *min => Some(pick(message, || {
                    format!("Must be at least {} characters", min)
                })),
                Some(_) => None,
                None => Some(type_mismatch("text", value)),
            },
            FieldRule::MaxLength { max, message } => match measure(value) {
                Some(len) if len > *max => Some(pick(message, || {
                    format!("Must be at most {} characters", max)
                })),
                Some(_) => None,
                None => Some(type_mismatch("text", value)),
            },
            FieldRule::Pattern { message, .. } => {
                self.check_regex(value, || pick(message, || "Invalid format".to_string()))
            }
            FieldRule::Email { message } => self.check_regex(value, || {
                pick(message, || "Invalid email address".to_string())
            }),
            FieldRule::Range { min, max, message } => match as_number(value) {
                Some(n) if min.is_some_and(|m| n < m) => Some(pick(message, || {
                    format!("Must be at least {}", min.unwrap_or_default())
                })),
                Some(n) if max.is_some_and(|m| n > m) => Some(pick(message, || {
                    format!("Must be at most {}", max.unwrap_or_default())
                })),
                Some(_) => None,
                None => Some(type_mismatch("number", value)),
            },
            FieldRule::OneOf {
                values: allowed,
                message,
            } => match value {
                Some(v) if allowed.contains(v) => None,
                _ => Some(pick(message, || {
                    let options: Vec<String> = allowed.iter().map(display_value).collect();
                    format!("Must be one of: {}", options.join(", "))
                })),
            },
            FieldRule::Matches {
                field: other,
                message,
            } => {
                let other_value = values.get(other).unwrap_or(&Value::Null);
                (value != Some(other_value))
                    .then(|| pick(message, || format!("Must match {}", other)))
            }
        };

        failure.map(|message| SchemaIssue::new(field, message).with_code(self.rule.code()))
    }

    fn check_regex(&self, value: Option<&Value>, message: impl FnOnce() -> String) -> Option<String> {
        match (value.and_then(Value::as_str), &self.regex) {
            (Some(text), Some(regex)) if regex.is_match(text) => None,
            (Some(_), _) => Some(message()),
            (None, _) => Some(type_mismatch("text", value)),
        }
    }
}

fn pick(message: &Option<String>, default: impl FnOnce() -> String) -> String {
    message.clone().unwrap_or_else(default)
}

fn measure(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Finite numeric reading of a value; `NaN` and infinities are not numbers
fn as_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn type_mismatch(expected: &str, value: Option<&Value>) -> String {
    let found = value.map(json_type_name).unwrap_or("nothing");
    format!("Expected {} but found {}", expected, found)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(rule: FieldRule, values: &FieldValues, field: &str) -> Option<String> {
        rule.compile()
            .unwrap()
            .check(field, values)
            .map(|issue| issue.message)
    }

    #[test]
    fn test_required() {
        let values = FieldValues::new().with("email", "");
        assert_eq!(
            check(FieldRule::required(), &values, "email").as_deref(),
            Some("email is required")
        );
        assert_eq!(
            check(FieldRule::required().with_message("Enter your email"), &values, "email")
                .as_deref(),
            Some("Enter your email")
        );
        let values = FieldValues::new().with("email", "a");
        assert!(check(FieldRule::required(), &values, "email").is_none());
    }

    #[test]
    fn test_non_required_rules_skip_empty_values() {
        let values = FieldValues::new().with("phone", "");
        assert!(check(FieldRule::min_length(8), &values, "phone").is_none());
        assert!(check(FieldRule::pattern("^[0-9]+$"), &values, "phone").is_none());
        assert!(check(FieldRule::one_of(["a"]), &values, "missing").is_none());
    }

    #[test]
    fn test_length_counts_characters() {
        let values = FieldValues::new().with("name", "héllo");
        assert!(check(FieldRule::min_length(5), &values, "name").is_none());
        assert_eq!(
            check(FieldRule::max_length(4), &values, "name").as_deref(),
            Some("Must be at most 4 characters")
        );
        assert_eq!(
            check(FieldRule::min_length(8), &values, "name").as_deref(),
            Some("Must be at least 8 characters")
        );
    }

    #[test]
    fn test_email_and_pattern() {
        let values = FieldValues::new()
            .with("good", "tech@repair.shop")
            .with("bad", "tech@repair")
            .with("code", "12a456");
        assert!(check(FieldRule::email(), &values, "good").is_none());
        assert_eq!(
            check(FieldRule::email(), &values, "bad").as_deref(),
            Some("Invalid email address")
        );
        assert_eq!(
            check(FieldRule::pattern(r"^\d{6}$"), &values, "code").as_deref(),
            Some("Invalid format")
        );
    }

    #[test]
    fn test_range_accepts_numeric_text() {
        let values = FieldValues::new()
            .with("hours", "2.5")
            .with("count", json!(12))
            .with("word", "many");
        assert!(check(FieldRule::range(Some(0.0), Some(8.0)), &values, "hours").is_none());
        assert_eq!(
            check(FieldRule::range(None, Some(10.0)), &values, "count").as_deref(),
            Some("Must be at most 10")
        );
        assert_eq!(
            check(FieldRule::range(Some(1.0), None), &values, "word").as_deref(),
            Some("Expected number but found string")
        );
    }

    #[test]
    fn test_range_rejects_non_finite_text() {
        let values = FieldValues::new()
            .with("hours", "NaN")
            .with("budget", "inf")
            .with("floor", "-Infinity");
        assert_eq!(
            check(FieldRule::range(Some(0.0), Some(8.0)), &values, "hours").as_deref(),
            Some("Expected number but found string")
        );
        assert!(check(FieldRule::range(Some(0.0), None), &values, "budget").is_some());
        assert!(check(FieldRule::range(None, Some(100.0)), &values, "floor").is_some());
    }

    #[test]
    fn test_one_of_and_matches() {
        let values = FieldValues::new()
            .with("priority", "whenever")
            .with("password", "secret123")
            .with("confirm", "secret124");
        assert_eq!(
            check(FieldRule::one_of(["low", "high"]), &values, "priority").as_deref(),
            Some("Must be one of: low, high")
        );
        assert_eq!(
            check(FieldRule::matches("password"), &values, "confirm").as_deref(),
            Some("Must match password")
        );
    }

    #[test]
    fn test_invalid_pattern_fails_to_compile() {
        assert!(FieldRule::pattern("([a-z]").compile().is_err());
    }

    #[test]
    fn test_rule_serde_shape() {
        let rule: FieldRule =
            serde_json::from_value(json!({"rule": "min_length", "min": 8})).unwrap();
        assert_eq!(rule, FieldRule::min_length(8));
        assert_eq!(rule.code(), "min_length");
    }
}
