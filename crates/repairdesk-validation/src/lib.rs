//! RepairDesk form validation
//!
//! Debounced, per-field validation of live form values against declarative
//! schemas, plus the form schemas and application stores of the RepairDesk
//! service dashboard.
//!
//! ## Architecture
//!
//! 1. **Values** (`values`): snapshots of a form's field values and the
//!    emptiness rule.
//!
//! 2. **Schema** (`schema`): the [`Schema`] collaborator trait and the
//!    declarative [`FormSchema`] (loadable from JSON, YAML or TOML).
//!
//! 3. **Debounce** (`debounce`): [`DebouncedValidator`], which turns a stream
//!    of snapshots into an eventually consistent [`ValidationState`] without
//!    validating on every keystroke.
//!
//! 4. **Forms** (`forms`): built-in schemas for the dashboard's login, agent,
//!    service-request and password-reset forms.
//!
//! 5. **Stores** (`stores`): explicit state containers (dashboard filters,
//!    forgot-password flow) with a defined lifecycle.
//!
//! 6. **Telemetry** (`telemetry`): Prometheus metrics for validation sessions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use repairdesk_validation::{forms, DebouncedValidator, FieldValues, ValidatorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let validator =
//!         DebouncedValidator::new(forms::login().unwrap(), ValidatorConfig::default()).unwrap();
//!
//!     validator.update(FieldValues::new().with("email", "").with("password", "ab"));
//!     validator.settled().await;
//!
//!     assert!(validator.error("email").is_none());
//!     assert_eq!(
//!         validator.error("password").as_deref(),
//!         Some("Password must be at least 8 characters")
//!     );
//! }
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod format;
pub mod forms;
pub mod schema;
pub mod state;
pub mod stores;
pub mod telemetry;
pub mod values;

pub use config::ValidatorConfig;
pub use debounce::{DebouncedValidator, ValidatorBuilder};
pub use error::{Result, ValidationError};
pub use forms::FormKind;
pub use schema::{
    FieldDefinition, FieldRule, FormSchema, Schema, SchemaDefinition, SchemaIssue, SchemaOutcome,
};
pub use state::{FieldValidationState, ValidationState};
pub use stores::{DashboardFilters, PasswordResetFlow, ResetStep, StoreRegistry};
pub use telemetry::{ValidatorMetrics, ValidatorMetricsRegistry};
pub use values::FieldValues;

/// Crate version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
