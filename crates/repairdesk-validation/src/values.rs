//! Field value snapshots
//!
//! A [`FieldValues`] is an immutable-by-convention snapshot of a form's live
//! values, keyed by field name. The surrounding form owns the values; the
//! validator only compares and reads snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, ValidationError};

/// Snapshot of named field values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, Value>);

impl FieldValues {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field value (builder style)
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Set a field value, returning the previous one
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove a field
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field value as a string slice, if it is a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Whether the field is absent, null or the empty string
    pub fn is_empty_field(&self, field: &str) -> bool {
        is_empty_value(self.0.get(field))
    }

    /// Field names in this snapshot
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over (field, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a snapshot from a JSON object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(ValidationError::invalid_input(format!(
                "Field values must be a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Names of fields whose value differs between `self` and `next`.
    ///
    /// A field present on one side only counts as changed unless the present
    /// side holds `null`, since absent and `null` are both "undefined".
    pub fn changed_fields(&self, next: &FieldValues) -> BTreeSet<String> {
        self.0
            .keys()
            .chain(next.0.keys())
            .filter(|field| {
                let before = self.0.get(*field).unwrap_or(&Value::Null);
                let after = next.0.get(*field).unwrap_or(&Value::Null);
                before != after
            })
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Emptiness rule: absent, `null` and `""` are empty; everything else,
/// including `0`, `false` and empty collections, is a value.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
