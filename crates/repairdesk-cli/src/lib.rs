//! RepairDesk validation CLI
//!
//! Runs form schemas outside of the dashboard: one-shot checks of a values
//! file, replay of a timed stream of snapshots through the debounced
//! validator, and export of the built-in form schemas.

pub mod commands;
pub mod output;

pub use commands::{SchemaSource, ValidateCli, ValidateCommands};
pub use output::{FieldReport, FormReport, OutputFormat};

use repairdesk_validation::ValidationError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every field passed
    Success = 0,
    /// At least one field failed validation
    ValidationFailed = 1,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Schema definition errors
    SchemaError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_validity(valid: bool) -> Self {
        if valid {
            ExitCode::Success
        } else {
            ExitCode::ValidationFailed
        }
    }

    /// Exit code for an error that aborted the command
    pub fn from_error(error: &ValidationError) -> Self {
        match error {
            ValidationError::FileError(_) => ExitCode::FileError,
            ValidationError::SchemaError(_) => ExitCode::SchemaError,
            e if e.is_user_error() => ExitCode::InvalidInput,
            _ => ExitCode::InternalError,
        }
    }
}

/// Run the parsed command
pub fn run(cli: ValidateCli) -> Result<ExitCode, ValidationError> {
    let quiet = cli.quiet;
    match cli.command {
        ValidateCommands::Check {
            source,
            values,
            format,
        } => commands::execute_check(source, values, format, quiet),
        ValidateCommands::Replay {
            source,
            events,
            config,
            delay_ms,
            metrics,
            format,
        } => commands::execute_replay(
            source,
            events,
            config,
            delay_ms,
            metrics,
            format,
            quiet,
        ),
        ValidateCommands::Schema { form, format } => commands::execute_schema(form, format),
    }
}

/// Run the CLI and map failures to an exit code
///
/// ```rust,no_run
/// use clap::Parser;
/// use repairdesk_cli::{run_cli, ValidateCli};
///
/// let cli = ValidateCli::parse();
/// std::process::exit(run_cli(cli).into());
/// ```
pub fn run_cli(cli: ValidateCli) -> ExitCode {
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::ValidationFailed), 1);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from_error(&ValidationError::file_error("missing")),
            ExitCode::FileError
        );
        assert_eq!(
            ExitCode::from_error(&ValidationError::schema_error("dangling")),
            ExitCode::SchemaError
        );
        assert_eq!(
            ExitCode::from_error(&ValidationError::parse_error("line 3")),
            ExitCode::InvalidInput
        );
        assert_eq!(
            ExitCode::from_error(&ValidationError::RuntimeError("no runtime".into())),
            ExitCode::InternalError
        );
    }

    #[test]
    fn test_exit_code_from_validity() {
        assert_eq!(ExitCode::from_validity(true), ExitCode::Success);
        assert_eq!(ExitCode::from_validity(false), ExitCode::ValidationFailed);
    }
}
