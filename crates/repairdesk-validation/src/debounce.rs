//! Debounced per-field validation
//!
//! [`DebouncedValidator`] watches successive [`FieldValues`] snapshots and,
//! for every field whose value changed, schedules a delayed validation pass
//! against a shared [`Schema`]. Each field has at most one scheduled or
//! in-flight pass; a newer change to the same field replaces an unfired
//! pass, so only the latest settled value is validated.
//!
//! # Lifecycle of a field
//!
//! 1. A change to an empty value cancels any pending pass and reports the
//!    field as idle immediately.
//! 2. A change to a non-empty value marks the field `is_validating` (the
//!    previous result stays visible until the pass completes) and
//!    schedules a pass after `delay_ms`, unless a pass for that field is
//!    already evaluating (in flight), in which case the change is skipped.
//! 3. When the pass fires it evaluates the schema against the *current*
//!    snapshot and writes the field's result. Schema faults become the
//!    configured fallback message.
//!
//! Tearing the session down (explicitly or on drop) aborts every pending
//! pass and guarantees no later state write.
//!
//! # Example
//!
//! ```rust,no_run
//! use repairdesk_validation::{forms, DebouncedValidator, FieldValues, ValidatorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let schema = forms::login().unwrap();
//!     let validator = DebouncedValidator::new(schema, ValidatorConfig::default()).unwrap();
//!
//!     validator.update(FieldValues::new().with("email", "tech@repair.shop"));
//!     assert!(validator.is_validating("email"));
//!
//!     validator.settled().await;
//!     assert!(validator.is_valid("email"));
//! }
//! ```

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ValidatorConfig;
use crate::error::{Result, ValidationError};
use crate::schema::Schema;
use crate::state::{FieldValidationState, ValidationState};
use crate::telemetry::{CancelReason, ValidatorMetrics};
use crate::values::FieldValues;

/// Scheduling record for one field
struct PendingValidation {
    ticket: u64,
    handle: JoinHandle<()>,
    in_flight: bool,
}

struct Session {
    values: FieldValues,
    state: ValidationState,
    pending: HashMap<String, PendingValidation>,
    last_changed: BTreeSet<String>,
    next_ticket: u64,
    closed: bool,
}

struct Shared {
    schema: Arc<dyn Schema>,
    config: ValidatorConfig,
    metrics: Option<Arc<ValidatorMetrics>>,
    session: Mutex<Session>,
    revision: watch::Sender<u64>,
}

/// Builder for [`DebouncedValidator`]
pub struct ValidatorBuilder {
    schema: Arc<dyn Schema>,
    config: ValidatorConfig,
    metrics: Option<Arc<ValidatorMetrics>>,
    initial: FieldValues,
}

impl ValidatorBuilder {
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics(mut self, metrics: Arc<ValidatorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot treated as already seen; its fields are not validated until
    /// they change
    pub fn initial_values(mut self, values: FieldValues) -> Self {
        self.initial = values;
        self
    }

    /// Build the session on the current tokio runtime
    pub fn build(self) -> Result<DebouncedValidator> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            ValidationError::RuntimeError(format!(
                "Debounced validation requires a tokio runtime: {}",
                e
            ))
        })?;

        let (revision, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            schema: self.schema,
            config: self.config,
            metrics: self.metrics,
            session: Mutex::new(Session {
                values: self.initial,
                state: ValidationState::new(),
                pending: HashMap::new(),
                last_changed: BTreeSet::new(),
                next_ticket: 0,
                closed: false,
            }),
            revision,
        });

        tracing::debug!(
            schema = shared.schema.name(),
            delay_ms = shared.config.delay_ms,
            "Started validation session"
        );

        Ok(DebouncedValidator { shared, runtime })
    }
}

/// One validation session over a live form
pub struct DebouncedValidator {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl DebouncedValidator {
    /// Create a session with the given schema and configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<S>(schema: S, config: ValidatorConfig) -> Result<Self>
    where
        S: Schema + 'static,
    {
        Self::builder(schema).config(config).build()
    }

    pub fn builder<S>(schema: S) -> ValidatorBuilder
    where
        S: Schema + 'static,
    {
        Self::builder_shared(Arc::new(schema))
    }

    /// Builder for a schema shared with other sessions
    pub fn builder_shared(schema: Arc<dyn Schema>) -> ValidatorBuilder {
        ValidatorBuilder {
            schema,
            config: ValidatorConfig::default(),
            metrics: None,
            initial: FieldValues::new(),
        }
    }

    /// Feed a fresh snapshot of the form's values.
    ///
    /// Only fields that differ from the previous snapshot are processed; an
    /// identical snapshot is a no-op.
    pub fn update(&self, next: FieldValues) {
        let mut guard = self.shared.session.lock();
        let session = &mut *guard;
        if session.closed {
            tracing::debug!("Ignoring snapshot for a closed validation session");
            return;
        }

        let changed = session.values.changed_fields(&next);
        if changed.is_empty() {
            return;
        }
        session.values = next;

        let mut dirty = false;
        let previous = std::mem::replace(&mut session.last_changed, changed.clone());
        for field in previous.intersection(&changed) {
            dirty |= self.shared.release_unfired(session, field);
        }

        let schema_name = self.shared.schema.name();
        for field in &changed {
            if session.values.is_empty_field(field) {
                if let Some(pending) = session.pending.remove(field) {
                    pending.handle.abort();
                    self.shared
                        .with_metrics(|m| m.record_cancelled(schema_name, CancelReason::Emptied));
                    dirty = true;
                }
                // fields gone from the snapshot are forgotten, not kept idle
                dirty |= if session.values.get(field).is_none() {
                    session.state.remove(field)
                } else {
                    session.state.set(field, FieldValidationState::idle())
                };
                continue;
            }

            if session.pending.get(field).is_some_and(|p| p.in_flight) {
                tracing::trace!(field = %field, "Pass in flight, skipping change");
                self.shared.with_metrics(|m| m.record_skipped(schema_name));
                continue;
            }

            if let Some(pending) = session.pending.remove(field) {
                pending.handle.abort();
                self.shared
                    .with_metrics(|m| m.record_cancelled(schema_name, CancelReason::Superseded));
            }

            dirty |= session.state.start_validating(field);

            let ticket = session.next_ticket;
            session.next_ticket += 1;
            let handle = self.runtime.spawn(run_pass(
                Arc::downgrade(&self.shared),
                field.clone(),
                ticket,
                self.shared.config.delay(),
            ));
            session.pending.insert(
                field.clone(),
                PendingValidation {
                    ticket,
                    handle,
                    in_flight: false,
                },
            );
            self.shared.with_metrics(|m| m.record_scheduled(schema_name));
            tracing::trace!(field = %field, ticket, "Scheduled validation pass");
        }

        drop(guard);
        if dirty {
            self.shared.bump();
        }
    }

    /// Tear the session down: abort every pending pass and clear all
    /// `is_validating` flags. Later snapshots are ignored.
    pub fn shutdown(&self) {
        let mut guard = self.shared.session.lock();
        let session = &mut *guard;
        if session.closed {
            return;
        }
        session.closed = true;

        let schema_name = self.shared.schema.name();
        let cancelled = session.pending.len();
        for (_, pending) in session.pending.drain() {
            pending.handle.abort();
            self.shared
                .with_metrics(|m| m.record_cancelled(schema_name, CancelReason::Teardown));
        }
        session.last_changed.clear();
        let dirty = session.state.stop_all();

        drop(guard);
        if dirty || cancelled > 0 {
            self.shared.bump();
        }
        tracing::debug!(schema = schema_name, cancelled, "Validation session shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.session.lock().closed
    }

    /// Full record for a field; idle when unknown
    pub fn field_state(&self, field: &str) -> FieldValidationState {
        self.shared.session.lock().state.field(field)
    }

    pub fn is_valid(&self, field: &str) -> bool {
        self.shared.session.lock().state.is_valid(field)
    }

    pub fn is_validating(&self, field: &str) -> bool {
        self.shared.session.lock().state.is_validating(field)
    }

    /// Error message; `None` when unknown or valid
    pub fn error(&self, field: &str) -> Option<String> {
        self.shared
            .session
            .lock()
            .state
            .error(field)
            .map(str::to_string)
    }

    /// Copy of the whole validation state
    pub fn state(&self) -> ValidationState {
        self.shared.session.lock().state.clone()
    }

    /// The latest snapshot seen
    pub fn values(&self) -> FieldValues {
        self.shared.session.lock().values.clone()
    }

    /// Whether a pass for `field` is currently evaluating
    pub fn is_in_flight(&self, field: &str) -> bool {
        self.shared
            .session
            .lock()
            .pending
            .get(field)
            .is_some_and(|p| p.in_flight)
    }

    /// Number of scheduled or in-flight passes
    pub fn pending_count(&self) -> usize {
        self.shared.session.lock().pending.len()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.shared.config
    }

    /// Receiver of the state revision counter. The counter moves on every
    /// observable change and on every completed pass.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    /// Wait until no pass is scheduled or in flight
    pub async fn settled(&self) {
        let mut revisions = self.subscribe();
        loop {
            if self.pending_count() == 0 {
                return;
            }
            if revisions.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for DebouncedValidator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DebouncedValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedValidator")
            .field("schema", &self.shared.schema.name())
            .field("delay_ms", &self.shared.config.delay_ms)
            .finish_non_exhaustive()
    }
}

async fn run_pass(shared: Weak<Shared>, field: String, ticket: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    if let Some(shared) = shared.upgrade() {
        shared.fire(&field, ticket);
    }
}

impl Shared {
    fn with_metrics(&self, record: impl FnOnce(&ValidatorMetrics)) {
        if let Some(metrics) = &self.metrics {
            record(metrics);
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Cancel an unfired pass carried over from the previous cycle and clear
    /// the field's validating flag. In-flight passes are left alone.
    fn release_unfired(&self, session: &mut Session, field: &str) -> bool {
        match session.pending.get(field) {
            Some(pending) if !pending.in_flight => {}
            _ => return false,
        }
        if let Some(pending) = session.pending.remove(field) {
            pending.handle.abort();
            self.with_metrics(|m| m.record_cancelled(self.schema.name(), CancelReason::Superseded));
        }
        session.state.stop_validating(field)
    }

    /// Run the pass identified by `ticket`, if it is still current
    fn fire(&self, field: &str, ticket: u64) {
        let snapshot = {
            let mut session = self.session.lock();
            if session.closed {
                return;
            }
            match session.pending.get_mut(field) {
                Some(pending) if pending.ticket == ticket => pending.in_flight = true,
                _ => return,
            }
            session.values.clone()
        };

        let schema_name = self.schema.name();
        let started = Instant::now();
        let evaluated = panic::catch_unwind(AssertUnwindSafe(|| self.schema.validate(&snapshot)));
        let elapsed = started.elapsed().as_secs_f64();

        let result = match evaluated {
            Ok(Ok(outcome)) => Ok(match outcome.first_issue_for(field) {
                Some(issue) => FieldValidationState::invalid(issue.message.clone()),
                None => FieldValidationState::valid(),
            }),
            Ok(Err(error)) => {
                tracing::warn!(
                    schema = schema_name,
                    field = %field,
                    error = %error,
                    "Schema evaluation failed"
                );
                Err(())
            }
            Err(_) => {
                tracing::warn!(
                    schema = schema_name,
                    field = %field,
                    "Schema evaluation panicked"
                );
                Err(())
            }
        };

        let mut session = self.session.lock();
        if session.closed {
            return;
        }
        match session.pending.get(field) {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                tracing::trace!(field = %field, ticket, "Discarding superseded pass");
                return;
            }
        }
        session.pending.remove(field);

        let next = match result {
            Ok(state) => {
                self.with_metrics(|m| m.record_pass(schema_name, state.is_valid, elapsed));
                state
            }
            Err(()) => {
                self.with_metrics(|m| m.record_fault(schema_name));
                FieldValidationState::invalid(self.config.fallback_error.clone())
            }
        };
        tracing::trace!(
            field = %field,
            ticket,
            is_valid = next.is_valid,
            "Validation pass complete"
        );
        session.state.set(field, next);
        drop(session);
        self.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaIssue, SchemaOutcome};

    fn non_empty_name(values: &FieldValues) -> Result<SchemaOutcome> {
        Ok(match values.get_str("name") {
            Some(name) if name.len() >= 3 => SchemaOutcome::Valid,
            _ => SchemaOutcome::Invalid(vec![SchemaIssue::new("name", "Name is too short")]),
        })
    }

    #[test]
    fn test_requires_runtime() {
        let err = DebouncedValidator::new(non_empty_name, ValidatorConfig::default()).unwrap_err();
        assert!(matches!(err, ValidationError::RuntimeError(_)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let config = ValidatorConfig::default().with_fallback_error("");
        assert!(DebouncedValidator::new(non_empty_name, config).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_marks_field_validating_immediately() {
        let validator = DebouncedValidator::new(non_empty_name, ValidatorConfig::default()).unwrap();

        validator.update(FieldValues::new().with("name", "Al"));
        assert_eq!(validator.field_state("name"), FieldValidationState::validating());
        assert_eq!(validator.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(
            validator.field_state("name"),
            FieldValidationState::invalid("Name is too short")
        );
        assert_eq!(validator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_values_are_not_validated() {
        let validator = DebouncedValidator::builder(non_empty_name)
            .initial_values(FieldValues::new().with("name", "Alice"))
            .build()
            .unwrap();

        validator.update(FieldValues::new().with("name", "Alice"));
        assert_eq!(validator.pending_count(), 0);
        assert_eq!(validator.revision(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_fields_are_pruned() {
        let validator = DebouncedValidator::new(non_empty_name, ValidatorConfig::default()).unwrap();

        validator.update(FieldValues::new().with("name", "Al").with("nickname", ""));
        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(validator.state().len(), 2);

        validator.update(FieldValues::new().with("nickname", ""));
        assert_eq!(validator.state().len(), 1);
        assert_eq!(validator.field_state("name"), FieldValidationState::idle());
        assert_eq!(validator.field_state("nickname"), FieldValidationState::idle());
    }

    #[tokio::test]
    async fn test_closed_session_ignores_updates() {
        let validator = DebouncedValidator::new(non_empty_name, ValidatorConfig::default()).unwrap();
        validator.shutdown();
        validator.update(FieldValues::new().with("name", "Alice"));

        assert!(validator.is_closed());
        assert_eq!(validator.pending_count(), 0);
        assert_eq!(validator.field_state("name"), FieldValidationState::idle());
    }
}
