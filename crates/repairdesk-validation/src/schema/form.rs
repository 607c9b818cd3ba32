//! Declarative form schemas
//!
//! A [`SchemaDefinition`] is plain data (loadable from JSON, YAML or TOML);
//! [`FormSchema`] is its compiled form and implements [`Schema`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::rules::{CompiledRule, FieldRule};
use super::{Schema, SchemaIssue, SchemaOutcome};
use crate::error::{Result, ValidationError};
use crate::format::load_document;
use crate::values::FieldValues;

/// Rules for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<FieldRule>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Append a rule
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Serializable description of a form schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl SchemaDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field definition
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Compile into an evaluable schema
    pub fn compile(self) -> Result<FormSchema> {
        FormSchema::from_definition(self)
    }
}

#[derive(Debug, Clone)]
struct CompiledField {
    name: String,
    rules: Vec<CompiledRule>,
}

/// Compiled declarative schema
///
/// Fields are evaluated in declaration order. Within a field the first
/// failing rule wins, so each field contributes at most one issue.
#[derive(Debug, Clone)]
pub struct FormSchema {
    definition: SchemaDefinition,
    fields: Vec<CompiledField>,
}

impl FormSchema {
    /// Compile a definition, rejecting duplicate fields, dangling `matches`
    /// references and invalid patterns
    pub fn from_definition(definition: SchemaDefinition) -> Result<Self> {
        let mut fields: Vec<CompiledField> = Vec::with_capacity(definition.fields.len());

        for field in &definition.fields {
            if field.name.is_empty() {
                return Err(ValidationError::schema_error(format!(
                    "Schema '{}' has a field with an empty name",
                    definition.name
                )));
            }
            if fields.iter().any(|f| f.name == field.name) {
                return Err(ValidationError::schema_error(format!(
                    "Field '{}' is declared more than once in schema '{}'",
                    field.name, definition.name
                )));
            }

            let rules = field
                .rules
                .iter()
                .map(|rule| {
                    rule.compile().map_err(|e| {
                        ValidationError::schema_error(format!("Field '{}': {}", field.name, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            fields.push(CompiledField {
                name: field.name.clone(),
                rules,
            });
        }

        for field in &definition.fields {
            for rule in &field.rules {
                if let FieldRule::Matches { field: other, .. } = rule {
                    if !definition.fields.iter().any(|f| &f.name == other) {
                        return Err(ValidationError::schema_error(format!(
                            "Field '{}' must match unknown field '{}'",
                            field.name, other
                        )));
                    }
                }
            }
        }

        tracing::debug!(
            schema = %definition.name,
            fields = fields.len(),
            "Compiled form schema"
        );

        Ok(Self { definition, fields })
    }

    /// Load and compile a definition from a JSON, YAML or TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let definition: SchemaDefinition = load_document(path)?;
        Self::from_definition(definition)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The definition this schema was compiled from
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    /// Declared field names, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Rule codes attached to a field
    pub fn rule_codes(&self, field: &str) -> Vec<&'static str> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.rules.iter().map(|r| r.rule().code()).collect())
            .unwrap_or_default()
    }

    /// Evaluate only the named fields. Used by multi-step flows that collect
    /// a form's fields over several screens.
    pub fn validate_fields(&self, values: &FieldValues, only: &[&str]) -> SchemaOutcome {
        self.collect_issues(values, |name| only.contains(&name))
    }

    fn collect_issues(&self, values: &FieldValues, include: impl Fn(&str) -> bool) -> SchemaOutcome {
        let issues: Vec<SchemaIssue> = self
            .fields
            .iter()
            .filter(|field| include(&field.name))
            .filter_map(|field| {
                field
                    .rules
                    .iter()
                    .find_map(|rule| rule.check(&field.name, values))
            })
            .collect();
        SchemaOutcome::from_issues(issues)
    }
}

impl Schema for FormSchema {
    fn validate(&self, values: &FieldValues) -> Result<SchemaOutcome> {
        Ok(self.collect_issues(values, |_| true))
    }

    fn name(&self) -> &str {
        &self.definition.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn signup() -> FormSchema {
        SchemaDefinition::new("signup")
            .field(
                FieldDefinition::new("email")
                    .rule(FieldRule::required())
                    .rule(FieldRule::email()),
            )
            .field(
                FieldDefinition::new("password")
                    .rule(FieldRule::required())
                    .rule(FieldRule::min_length(8)),
            )
            .field(FieldDefinition::new("confirm").rule(FieldRule::matches("password")))
            .compile()
            .unwrap()
    }

    #[test]
    fn test_first_failing_rule_per_field() {
        let outcome = signup()
            .validate(&FieldValues::new().with("email", "").with("password", "ab"))
            .unwrap();
        let issues = outcome.issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "email is required");
        assert_eq!(issues[1].message, "Must be at least 8 characters");
        assert_eq!(issues[1].code.as_deref(), Some("min_length"));
    }

    #[test]
    fn test_valid_snapshot() {
        let values = FieldValues::new()
            .with("email", "a@b.com")
            .with("password", "longenough1")
            .with("confirm", "longenough1");
        assert!(signup().validate(&values).unwrap().is_valid());
    }

    #[test]
    fn test_validate_fields_subset() {
        let values = FieldValues::new().with("email", "a@b.com");
        let outcome = signup().validate_fields(&values, &["email"]);
        assert!(outcome.is_valid());
        assert!(!signup().validate(&values).unwrap().is_valid());
    }

    #[test]
    fn test_duplicate_and_dangling_fields_rejected() {
        let duplicate = SchemaDefinition::new("dup")
            .field(FieldDefinition::new("a"))
            .field(FieldDefinition::new("a"))
            .compile();
        assert!(matches!(duplicate, Err(ValidationError::SchemaError(_))));

        let dangling = SchemaDefinition::new("dangling")
            .field(FieldDefinition::new("confirm").rule(FieldRule::matches("password")))
            .compile();
        assert!(dangling.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
name: login
fields:
  - name: email
    rules:
      - rule: required
      - rule: email
        message: Use your work email
  - name: password
    rules:
      - rule: min_length
        min: 8
"#
        )
        .unwrap();

        let schema = FormSchema::from_file(file.path()).unwrap();
        assert_eq!(schema.name(), "login");
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["email", "password"]);
        assert_eq!(schema.rule_codes("email"), vec!["required", "email"]);

        let outcome = schema
            .validate(&FieldValues::new().with("email", "nope"))
            .unwrap();
        assert_eq!(
            outcome.first_issue_for("email").unwrap().message,
            "Use your work email"
        );
    }
}
