//! Output formatting for the validation CLI
//!
//! Reports render as JSON, YAML, or a colored table.

use clap::ValueEnum;
use colored::Colorize;
use repairdesk_validation::{
    FieldValidationState, FieldValues, FormSchema, Result, SchemaOutcome, ValidationState,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Reported status of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Valid,
    Invalid,
    /// Empty and not flagged
    Idle,
    /// A pass was still pending when the report was taken
    Validating,
}

impl FieldStatus {
    /// Colored status padded to the table column
    fn label(self) -> colored::ColoredString {
        match self {
            FieldStatus::Valid => format!("{:<10}", "valid").green(),
            FieldStatus::Invalid => format!("{:<10}", "invalid").red(),
            FieldStatus::Idle => format!("{:<10}", "idle").dimmed(),
            FieldStatus::Validating => format!("{:<10}", "validating").yellow(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: String,
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldReport {
    fn from_state(field: &str, state: &FieldValidationState) -> Self {
        let status = if state.is_validating {
            FieldStatus::Validating
        } else if state.is_valid {
            FieldStatus::Valid
        } else if state.error.is_some() {
            FieldStatus::Invalid
        } else {
            FieldStatus::Idle
        };
        Self {
            field: field.to_string(),
            status,
            message: state.error.clone(),
        }
    }
}

/// Per-field results for one form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormReport {
    pub schema: String,
    pub valid: bool,
    pub fields: Vec<FieldReport>,
    pub summary: String,
}

impl FormReport {
    /// Report for a one-shot evaluation of the whole form
    pub fn from_outcome(schema: &FormSchema, values: &FieldValues, outcome: &SchemaOutcome) -> Self {
        let fields = schema
            .field_names()
            .map(|field| match outcome.first_issue_for(field) {
                Some(issue) => FieldReport {
                    field: field.to_string(),
                    status: FieldStatus::Invalid,
                    message: Some(issue.message.clone()),
                },
                None if values.is_empty_field(field) => FieldReport {
                    field: field.to_string(),
                    status: FieldStatus::Idle,
                    message: None,
                },
                None => FieldReport {
                    field: field.to_string(),
                    status: FieldStatus::Valid,
                    message: None,
                },
            })
            .collect();
        Self::new(schema.name(), fields)
    }

    /// Report for the state a debounced session settled into. Declared
    /// fields come first, then any other field the session tracked.
    pub fn from_state(schema: &FormSchema, state: &ValidationState) -> Self {
        let mut fields: Vec<FieldReport> = schema
            .field_names()
            .map(|field| FieldReport::from_state(field, &state.field(field)))
            .collect();
        for (field, field_state) in state.iter() {
            if !fields.iter().any(|report| report.field == field) {
                fields.push(FieldReport::from_state(field, field_state));
            }
        }
        Self::new(schema.name(), fields)
    }

    fn new(schema: &str, fields: Vec<FieldReport>) -> Self {
        let invalid = fields
            .iter()
            .filter(|f| f.status == FieldStatus::Invalid)
            .count();
        let summary = if invalid == 0 {
            format!("Form '{}' passed", schema)
        } else {
            format!("Form '{}' has {} invalid field(s)", schema, invalid)
        };
        Self {
            schema: schema.to_string(),
            valid: invalid == 0,
            fields,
            summary,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => print_json(self),
            OutputFormat::Yaml => print_yaml(self),
            OutputFormat::Table => {
                self.render_table();
                Ok(())
            }
        }
    }

    fn render_table(&self) {
        let mut stdout = io::stdout();

        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Validation Results".cyan().bold()).ok();
        writeln!(stdout, "{}", "=".repeat(60)).ok();

        let icon = if self.valid { "+".green() } else { "x".red() };
        writeln!(stdout, "{} {}", icon, self.summary).ok();
        writeln!(stdout).ok();

        let width = self
            .fields
            .iter()
            .map(|f| f.field.len())
            .max()
            .unwrap_or(0)
            .max(5);
        writeln!(stdout, "{:<width$}  {:<10}  {}", "Field", "Status", "Message").ok();
        writeln!(stdout, "{}", "-".repeat(60)).ok();
        for report in &self.fields {
            writeln!(
                stdout,
                "{:<width$}  {}  {}",
                report.field,
                report.status.label(),
                report.message.as_deref().unwrap_or("")
            )
            .ok();
        }
        writeln!(stdout).ok();
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    print!("{}", serde_yaml::to_string(value)?);
    Ok(())
}
