//! CLI command definitions
//!
//! Clap-based commands for checking values against a form schema, replaying
//! timed snapshot streams through the debounced validator, and exporting the
//! built-in schemas.

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use repairdesk_validation::telemetry::ValidatorMetricsRegistry;
use repairdesk_validation::{
    format, forms, DebouncedValidator, FieldValues, FormKind, FormSchema, Result, Schema,
    ValidationError, ValidatorConfig,
};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::output::{print_json, print_yaml, FormReport, OutputFormat};
use crate::ExitCode;

/// RepairDesk form validation CLI
#[derive(Parser, Debug)]
#[command(name = "repairdesk-validate")]
#[command(about = "Check and replay RepairDesk form values against their schemas", long_about = None)]
#[command(version)]
pub struct ValidateCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress everything except the report and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: ValidateCommands,
}

/// Where the schema comes from: a built-in form or a definition file
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SchemaSource {
    /// Built-in form (login, agent, service-request, password-reset)
    #[arg(short, long)]
    pub form: Option<FormKind>,

    /// Schema definition file (JSON, YAML or TOML)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,
}

impl SchemaSource {
    pub fn load(&self) -> Result<FormSchema> {
        match (&self.form, &self.schema) {
            (Some(kind), _) => forms::builtin(*kind),
            (None, Some(path)) => FormSchema::from_file(path),
            (None, None) => Err(ValidationError::invalid_input(
                "Either --form or --schema is required",
            )),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum ValidateCommands {
    /// Validate a values file against a form schema in one pass
    Check {
        #[command(flatten)]
        source: SchemaSource,

        /// Field values (JSON, YAML or TOML object)
        #[arg(long)]
        values: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Replay timed snapshots through the debounced validator
    ///
    /// Each line of the events file is a JSON object
    /// `{"after_ms": 120, "values": {...}}`; `after_ms` is the pause before
    /// the snapshot is fed. The final state is reported once every pending
    /// pass has completed.
    Replay {
        #[command(flatten)]
        source: SchemaSource,

        /// Snapshot stream (JSON lines)
        #[arg(short, long)]
        events: PathBuf,

        /// Validator configuration file; defaults to the environment
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the debounce delay
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print Prometheus metrics after the report
        #[arg(long)]
        metrics: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print a built-in form schema
    Schema {
        /// Built-in form
        #[arg(short, long)]
        form: FormKind,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },
}

/// One entry of a replay stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayEvent {
    #[serde(default)]
    pub after_ms: u64,
    pub values: FieldValues,
}

/// Parse a JSON-lines replay stream. Blank lines and `#` comments are skipped.
pub fn parse_events(content: &str) -> Result<Vec<ReplayEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                ValidationError::parse_error(format!("Event on line {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn read_file(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ValidationError::file_error(format!(
            "Failed to read {} '{}': {}",
            what,
            path.display(),
            e
        ))
    })
}

/// Execute the check command
pub fn execute_check(
    source: SchemaSource,
    values: PathBuf,
    output_format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let schema = source.load()?;
    let values: FieldValues = format::load_document(&values)?;

    tracing::info!(schema = schema.name(), fields = values.len(), "Checking values");
    let outcome = schema.validate(&values)?;
    let report = FormReport::from_outcome(&schema, &values, &outcome);
    if !quiet || !report.valid {
        report.render(output_format)?;
    }
    Ok(ExitCode::from_validity(report.valid))
}

/// Execute the replay command
pub fn execute_replay(
    source: SchemaSource,
    events: PathBuf,
    config: Option<PathBuf>,
    delay_ms: Option<u64>,
    metrics: bool,
    output_format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let schema = source.load()?;
    let events = parse_events(&read_file(&events, "events file")?)?;

    let mut validator_config = match &config {
        Some(path) => ValidatorConfig::from_file(path)?,
        None => ValidatorConfig::from_env()?,
    };
    if let Some(delay_ms) = delay_ms {
        validator_config = validator_config.with_delay_ms(delay_ms);
    }

    let registry = ValidatorMetricsRegistry::new()
        .map_err(|e| ValidationError::InternalError(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| ValidationError::RuntimeError(e.to_string()))?;

    let report = runtime.block_on(replay(
        schema,
        events,
        validator_config,
        registry.validator(),
    ))?;

    if !quiet || !report.valid {
        report.render(output_format)?;
    }
    if metrics {
        let text = registry
            .encode_text()
            .map_err(|e| ValidationError::InternalError(e.to_string()))?;
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", "Metrics".cyan().bold()).ok();
        write!(stdout, "{}", text).ok();
    }
    Ok(ExitCode::from_validity(report.valid))
}

/// Feed `events` through a fresh session and report the settled state
pub async fn replay(
    schema: FormSchema,
    events: Vec<ReplayEvent>,
    config: ValidatorConfig,
    metrics: Arc<repairdesk_validation::ValidatorMetrics>,
) -> Result<FormReport> {
    let shared = Arc::new(schema);
    let validator = DebouncedValidator::builder_shared(shared.clone())
        .config(config)
        .metrics(metrics)
        .build()?;

    for (index, event) in events.into_iter().enumerate() {
        if event.after_ms > 0 {
            tokio::time::sleep(Duration::from_millis(event.after_ms)).await;
        }
        tracing::debug!(event = index, fields = event.values.len(), "Feeding snapshot");
        validator.update(event.values);
    }
    validator.settled().await;

    let report = FormReport::from_state(&shared, &validator.state());
    validator.shutdown();
    Ok(report)
}

/// Execute the schema command
pub fn execute_schema(form: FormKind, output_format: OutputFormat) -> Result<ExitCode> {
    let definition = forms::definition(form);
    match output_format {
        OutputFormat::Json => print_json(&definition)?,
        OutputFormat::Yaml => print_yaml(&definition)?,
        OutputFormat::Table => {
            // compile to surface definition errors and reach rule codes
            let schema = definition.compile()?;
            let mut stdout = io::stdout();
            writeln!(stdout, "{} {}", "Form".cyan().bold(), schema.name().bold()).ok();
            writeln!(stdout, "{}", "-".repeat(60)).ok();
            for field in schema.field_names() {
                writeln!(stdout, "  {:<20} {}", field, schema.rule_codes(field).join(", ")).ok();
            }
        }
    }
    Ok(ExitCode::Success)
}
