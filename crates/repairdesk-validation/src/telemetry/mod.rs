//! Telemetry for debounced validation sessions
//!
//! - `metrics` - Prometheus counters, gauges and histograms for scheduling,
//!   cancellation and pass outcomes

pub mod metrics;

pub use metrics::{CancelReason, ValidatorMetrics, ValidatorMetricsRegistry};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
