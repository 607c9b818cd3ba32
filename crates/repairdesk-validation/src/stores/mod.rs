//! Application state containers
//!
//! Stores are plain values owned by a [`StoreRegistry`]. The registry is
//! created by the application and passed to consumers; each store is built
//! on first use and can be reset explicitly.

pub mod filters;
pub mod password_reset;

pub use filters::{DashboardFilters, DateRange, RequestStatus};
pub use password_reset::{PasswordResetFlow, ResetStep};

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{Result, ValidationError};

/// Lazily initialized application stores
#[derive(Default)]
pub struct StoreRegistry {
    filters: Mutex<Option<DashboardFilters>>,
    password_reset: Mutex<Option<PasswordResetFlow>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dashboard filters, created on first access
    pub fn filters(&self) -> MappedMutexGuard<'_, DashboardFilters> {
        MutexGuard::map(self.filters.lock(), |slot| {
            slot.get_or_insert_with(DashboardFilters::default)
        })
    }

    /// Password-reset flow, created on first access
    pub fn password_reset(&self) -> Result<MappedMutexGuard<'_, PasswordResetFlow>> {
        let mut guard = self.password_reset.lock();
        if guard.is_none() {
            *guard = Some(PasswordResetFlow::new()?);
            tracing::debug!("Initialized password reset store");
        }
        MutexGuard::try_map(guard, Option::as_mut).map_err(|_| {
            ValidationError::InternalError("Password reset store is not initialized".to_string())
        })
    }

    /// Whether each store has been created: (filters, password_reset)
    pub fn initialized(&self) -> (bool, bool) {
        (
            self.filters.lock().is_some(),
            self.password_reset.lock().is_some(),
        )
    }

    /// Drop every store; the next access starts from the initial state
    pub fn reset_all(&self) {
        *self.filters.lock() = None;
        *self.password_reset.lock() = None;
        tracing::debug!("Reset application stores");
    }
}
