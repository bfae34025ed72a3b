//! Hand-driven clock

use crate::time::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Clone, Debug)]
pub struct ManualClock {
    instant: Arc<Mutex<Instant>>,
    base: Instant,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            instant: Arc::new(Mutex::new(now)),
            base: now,
        }
    }

    /// Advance time by a duration
    pub fn advance(&self, duration: Duration) {
        *self.instant.lock() += duration;
    }

    pub fn advance_ms(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.now().saturating_duration_since(self.base)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.instant.lock()
    }
}
