//! Prometheus metrics for debounced validation
//!
//! - `passes_scheduled_total` (counter) - delayed passes scheduled, by schema
//! - `passes_cancelled_total` (counter) - passes cancelled before firing, by reason
//! - `changes_skipped_total` (counter) - changes ignored while a pass was in flight
//! - `passes_total` (counter) - completed passes, by schema and result
//! - `schema_faults_total` (counter) - schema evaluation faults, by schema
//! - `pass_duration_seconds` (histogram) - schema evaluation time
//! - `pending_passes` (gauge) - scheduled or in-flight passes
//!
//! # Example
//!
//! ```rust
//! use repairdesk_validation::telemetry::ValidatorMetricsRegistry;
//!
//! let registry = ValidatorMetricsRegistry::new().unwrap();
//! registry.validator().record_scheduled("login");
//! assert!(registry.encode_text().unwrap().contains("passes_scheduled_total"));
//! ```

use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "repairdesk_validation";

/// Why a scheduled pass was dropped before firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// A newer change to the same field arrived
    Superseded,
    /// The field became empty
    Emptied,
    /// The session was torn down
    Teardown,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::Superseded => "superseded",
            CancelReason::Emptied => "emptied",
            CancelReason::Teardown => "teardown",
        }
    }
}

/// Validator metrics for Prometheus
pub struct ValidatorMetrics {
    scheduled_total: CounterVec,
    cancelled_total: CounterVec,
    skipped_total: CounterVec,
    passes_total: CounterVec,
    faults_total: CounterVec,
    pass_duration_seconds: HistogramVec,
    pending: Gauge,
}

impl ValidatorMetrics {
    /// Create metrics and register them with the provided registry
    pub fn new(registry: &Registry) -> Result<Self> {
        let scheduled_total = CounterVec::new(
            Opts::new(
                "passes_scheduled_total",
                "Total number of debounced validation passes scheduled",
            )
            .namespace(NAMESPACE),
            &["schema"],
        )?;

        let cancelled_total = CounterVec::new(
            Opts::new(
                "passes_cancelled_total",
                "Total number of scheduled passes cancelled before firing",
            )
            .namespace(NAMESPACE),
            &["schema", "reason"],
        )?;

        let skipped_total = CounterVec::new(
            Opts::new(
                "changes_skipped_total",
                "Total number of field changes ignored while a pass was in flight",
            )
            .namespace(NAMESPACE),
            &["schema"],
        )?;

        let passes_total = CounterVec::new(
            Opts::new("passes_total", "Total number of completed validation passes")
                .namespace(NAMESPACE),
            &["schema", "result"],
        )?;

        let faults_total = CounterVec::new(
            Opts::new(
                "schema_faults_total",
                "Total number of schema evaluation faults",
            )
            .namespace(NAMESPACE),
            &["schema"],
        )?;

        let pass_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pass_duration_seconds",
                "Schema evaluation duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["schema"],
        )?;

        let pending = Gauge::with_opts(
            Opts::new("pending_passes", "Validation passes scheduled or in flight")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(scheduled_total.clone()))?;
        registry.register(Box::new(cancelled_total.clone()))?;
        registry.register(Box::new(skipped_total.clone()))?;
        registry.register(Box::new(passes_total.clone()))?;
        registry.register(Box::new(faults_total.clone()))?;
        registry.register(Box::new(pass_duration_seconds.clone()))?;
        registry.register(Box::new(pending.clone()))?;

        Ok(Self {
            scheduled_total,
            cancelled_total,
            skipped_total,
            passes_total,
            faults_total,
            pass_duration_seconds,
            pending,
        })
    }

    /// Record a scheduled pass
    pub fn record_scheduled(&self, schema: &str) {
        self.scheduled_total.with_label_values(&[schema]).inc();
        self.pending.inc();
    }

    /// Record a pass cancelled before it fired
    pub fn record_cancelled(&self, schema: &str, reason: CancelReason) {
        self.cancelled_total
            .with_label_values(&[schema, reason.as_str()])
            .inc();
        self.pending.dec();
    }

    /// Record a change skipped because a pass was in flight
    pub fn record_skipped(&self, schema: &str) {
        self.skipped_total.with_label_values(&[schema]).inc();
    }

    /// Record a completed pass
    pub fn record_pass(&self, schema: &str, valid: bool, duration_secs: f64) {
        let result = if valid { "valid" } else { "invalid" };
        self.passes_total.with_label_values(&[schema, result]).inc();
        self.pass_duration_seconds
            .with_label_values(&[schema])
            .observe(duration_secs);
        self.pending.dec();
    }

    /// Record a pass that ended in a schema fault
    pub fn record_fault(&self, schema: &str) {
        self.faults_total.with_label_values(&[schema]).inc();
        self.passes_total.with_label_values(&[schema, "fault"]).inc();
        self.pending.dec();
    }

    /// Current number of scheduled or in-flight passes
    pub fn pending(&self) -> f64 {
        self.pending.get()
    }
}

/// Registry owning a [`ValidatorMetrics`] set
pub struct ValidatorMetricsRegistry {
    registry: Arc<Registry>,
    validator: Arc<ValidatorMetrics>,
}

impl ValidatorMetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create with an existing Prometheus registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let validator = Arc::new(ValidatorMetrics::new(&registry)?);
        Ok(Self {
            registry,
            validator,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Shared handle for injecting into validator sessions
    pub fn validator(&self) -> Arc<ValidatorMetrics> {
        Arc::clone(&self.validator)
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }
}
