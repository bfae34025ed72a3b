//! Seek arbitration.
//!
//! Engines report position asynchronously, so ticks emitted right after a seek
//! still carry the pre-seek offset. Trusting them makes the scrubber snap back.
//! [`SeekArbiter`] distrusts ticks from seek-start until a settle deadline has
//! passed after the seek was committed.
//!
//! ```text
//! Idle --begin/drag--> SeekPending --commit--> SeekSettling --deadline--> Idle
//!                          ^                        |
//!                          +--------begin-----------+
//! ```

use std::time::{Duration, Instant};
use tracing::debug;

/// Whether incoming engine ticks are trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekState {
    Idle,
    /// The user is choosing a target; the display follows the gesture.
    SeekPending { target_fraction: f64 },
    /// The engine has been told to seek; ticks are ignored until `deadline`.
    SeekSettling {
        target_fraction: f64,
        deadline: Instant,
    },
}

impl SeekState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SeekState::Idle)
    }

    pub fn target_fraction(&self) -> Option<f64> {
        match *self {
            SeekState::Idle => None,
            SeekState::SeekPending { target_fraction }
            | SeekState::SeekSettling {
                target_fraction, ..
            } => Some(target_fraction),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeekArbiter {
    state: SeekState,
    settle_window: Duration,
    clamp_max: f64,
}

impl SeekArbiter {
    pub fn new(settle_window: Duration, clamp_max: f64) -> Self {
        Self {
            state: SeekState::Idle,
            settle_window,
            clamp_max,
        }
    }

    pub fn state(&self) -> SeekState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn target_fraction(&self) -> Option<f64> {
        self.state.target_fraction()
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SeekState::SeekSettling { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Clamps a requested fraction into `[0, clamp_max]`.
    pub fn clamp_fraction(&self, fraction: f64) -> f64 {
        if fraction.is_finite() {
            fraction.clamp(0.0, self.clamp_max)
        } else {
            0.0
        }
    }

    /// Seek-start (pointer-down on the scrubber).
    ///
    /// From `Idle` the gesture starts at `current_fraction`. Restarting a seek
    /// while settling drops the old deadline and keeps the last target.
    pub fn begin(&mut self, current_fraction: f64) {
        self.state = match self.state {
            SeekState::Idle => SeekState::SeekPending {
                target_fraction: self.clamp_fraction(current_fraction),
            },
            SeekState::SeekSettling {
                target_fraction, ..
            } => SeekState::SeekPending { target_fraction },
            pending @ SeekState::SeekPending { .. } => pending,
        };
    }

    /// Gesture moved. Starts a seek implicitly when idle.
    pub fn drag(&mut self, fraction: f64) -> f64 {
        let target_fraction = self.clamp_fraction(fraction);
        self.state = SeekState::SeekPending { target_fraction };
        target_fraction
    }

    /// Seek-commit. Returns the clamped fraction the engine should seek to.
    pub fn commit(&mut self, fraction: f64, now: Instant) -> f64 {
        let target_fraction = self.clamp_fraction(fraction);
        let deadline = now + self.settle_window;
        debug!(
            target: "playhead::seek",
            target_fraction,
            settle_ms = self.settle_window.as_millis() as u64,
            "seek committed"
        );
        self.state = SeekState::SeekSettling {
            target_fraction,
            deadline,
        };
        target_fraction
    }

    /// Leaves `SeekSettling` once the deadline has passed.
    ///
    /// Returns the settled target fraction on the transition back to `Idle`.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        match self.state {
            SeekState::SeekSettling {
                target_fraction,
                deadline,
            } if now >= deadline => {
                self.state = SeekState::Idle;
                debug!(target: "playhead::seek", target_fraction, "seek settled");
                Some(target_fraction)
            }
            _ => None,
        }
    }

    /// Drops any seek in progress, including a pending settle deadline.
    pub fn cancel(&mut self) {
        self.state = SeekState::Idle;
    }
}
