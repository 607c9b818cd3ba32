//! Validator configuration
//!
//! Defaults match the dashboard's behavior (300ms debounce window). Values
//! can be overridden from the environment or from a config file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ValidationError};
use crate::format::load_document;

/// Default debounce window in milliseconds
pub const DEFAULT_DELAY_MS: u64 = 300;

/// Message written when schema evaluation faults
pub const DEFAULT_FALLBACK_ERROR: &str = "Validation error";

const ENV_DELAY_MS: &str = "REPAIRDESK_VALIDATION_DELAY_MS";
const ENV_FALLBACK_ERROR: &str = "REPAIRDESK_VALIDATION_FALLBACK_ERROR";

/// Configuration for a debounced validator session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Quiet period before a changed field is validated
    pub delay_ms: u64,
    /// Error message used when the schema itself fails
    pub fallback_error: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            fallback_error: DEFAULT_FALLBACK_ERROR.to_string(),
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce window
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the fault fallback message
    pub fn with_fallback_error(mut self, message: impl Into<String>) -> Self {
        self.fallback_error = message.into();
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Defaults overridden by `REPAIRDESK_VALIDATION_*` variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_DELAY_MS) {
            config.delay_ms = raw.trim().parse().map_err(|_| {
                ValidationError::invalid_input(format!(
                    "{} must be a whole number of milliseconds, got '{}'",
                    ENV_DELAY_MS, raw
                ))
            })?;
        }
        if let Ok(message) = std::env::var(ENV_FALLBACK_ERROR) {
            config.fallback_error = message;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON, YAML or TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = load_document(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a session
    pub fn validate(&self) -> Result<()> {
        if self.fallback_error.trim().is_empty() {
            return Err(ValidationError::invalid_input(
                "fallback_error must not be empty",
            ));
        }
        Ok(())
    }
}
