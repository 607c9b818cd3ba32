//! Integration tests for the validation CLI commands

use repairdesk_cli::commands::{self, parse_events};
use repairdesk_cli::output::FieldStatus;
use repairdesk_cli::{ExitCode, OutputFormat, SchemaSource};
use repairdesk_validation::telemetry::ValidatorMetricsRegistry;
use repairdesk_validation::{forms, FormKind, ValidatorConfig};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn builtin(kind: FormKind) -> SchemaSource {
    SchemaSource {
        form: Some(kind),
        schema: None,
    }
}

#[test]
fn test_check_valid_values() {
    let values = temp_file(".json", r#"{"email": "a@b.com", "password": "longenough1"}"#);
    let code = commands::execute_check(
        builtin(FormKind::Login),
        values.path().to_path_buf(),
        OutputFormat::Json,
        true,
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_check_invalid_values_with_schema_file() {
    let schema = temp_file(
        ".yaml",
        r#"
name: device_intake
fields:
  - name: serial
    rules:
      - rule: required
      - rule: pattern
        pattern: "^SN-[0-9]{4}$"
        message: Serial must look like SN-1234
"#,
    );
    let values = temp_file(".toml", "serial = \"1234\"\n");

    let code = commands::execute_check(
        SchemaSource {
            form: None,
            schema: Some(schema.path().to_path_buf()),
        },
        values.path().to_path_buf(),
        OutputFormat::Yaml,
        false,
    )
    .unwrap();
    assert_eq!(code, ExitCode::ValidationFailed);
}

#[test]
fn test_check_missing_values_file() {
    let err = commands::execute_check(
        builtin(FormKind::Login),
        PathBuf::from("/nonexistent/values.json"),
        OutputFormat::Table,
        true,
    )
    .unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::FileError);
}

#[tokio::test(start_paused = true)]
async fn test_replay_reports_settled_state() {
    let events = parse_events(
        r#"
{"values": {"email": "a", "password": ""}}
{"after_ms": 100, "values": {"email": "a@b", "password": ""}}
{"after_ms": 100, "values": {"email": "a@b.com", "password": "ab"}}
"#,
    )
    .unwrap();
    let registry = ValidatorMetricsRegistry::new().unwrap();

    let report = commands::replay(
        forms::login().unwrap(),
        events,
        ValidatorConfig::default(),
        registry.validator(),
    )
    .await
    .unwrap();

    assert!(!report.valid);
    let email = &report.fields[0];
    assert_eq!(email.field, "email");
    assert_eq!(email.status, FieldStatus::Valid);
    let password = &report.fields[1];
    assert_eq!(password.status, FieldStatus::Invalid);
    assert_eq!(
        password.message.as_deref(),
        Some("Password must be at least 8 characters")
    );

    let text = registry.encode_text().unwrap();
    assert!(text.contains("repairdesk_validation_passes_scheduled_total"));
}

#[tokio::test(start_paused = true)]
async fn test_replay_of_emptied_form_is_idle() {
    let events = parse_events(
        r#"
{"values": {"name": "Jo"}}
{"after_ms": 50, "values": {"name": ""}}
"#,
    )
    .unwrap();
    let registry = ValidatorMetricsRegistry::new().unwrap();

    let report = commands::replay(
        forms::agent().unwrap(),
        events,
        ValidatorConfig::default(),
        registry.validator(),
    )
    .await
    .unwrap();

    assert!(report.valid);
    assert!(report.fields.iter().all(|f| f.status == FieldStatus::Idle));
}

#[test]
fn test_schema_export() {
    for kind in FormKind::ALL {
        assert_eq!(
            commands::execute_schema(kind, OutputFormat::Json).unwrap(),
            ExitCode::Success
        );
    }
}
