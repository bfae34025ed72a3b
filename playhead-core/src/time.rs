//! Time source abstraction
//!
//! Settle windows and checkpoint intervals are measured against a [`Clock`] so
//! hosts and tests can drive time explicitly.

use std::time::Instant;

/// Trait for providing time in tests and production
pub trait Clock: Send + Sync + 'static {
    /// Get the current instant
    fn now(&self) -> Instant;
}

/// Production clock that uses real monotonic time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
