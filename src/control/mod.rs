//! Hardware control layer
//!
//! Safety-gated access to the embedded controller and model-specific
//! registers, plus the power-limit logic built on top of them.

pub mod ec;
pub mod msr;
pub mod power;

pub use ec::{registers, RegisterChannel, MIN_SETTLE, WRITE_ALLOWLIST};
pub use msr::{MsrAccess, MsrAddressMap, VoltagePlane};
pub use power::{AppliedPower, PowerLimitController, PowerRegisterMap, PowerStrategy};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a handle mutex, recovering the guard if a previous holder panicked
pub(crate) fn lock_handle<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
