//! RepairDesk validation CLI
//!
//! # Usage
//!
//! ```bash
//! # Check a values file against a built-in form
//! repairdesk-validate check --form login --values login.json
//!
//! # Replay timed snapshots through the debounced validator
//! repairdesk-validate replay --form agent --events typing.jsonl --delay-ms 200
//!
//! # Export a built-in schema
//! repairdesk-validate schema --form password-reset --format yaml
//! ```
//!
//! # Exit Codes
//!
//! - 0: Every field passed
//! - 1: At least one field failed validation
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 5: Schema definition errors
//! - 10: Internal error

use clap::Parser;
use repairdesk_cli::{run_cli, ValidateCli};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = ValidateCli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
