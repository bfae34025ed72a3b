//! Test doubles for the controller's ports.
//!
//! Everything here is deterministic: time only moves when a test advances the
//! [`ManualClock`], and background writes only run when the test drains the
//! [`QueuedSpawner`].

mod clock;
mod stubs;

pub use clock::ManualClock;
pub use stubs::{MemoryProgressStore, QueuedSpawner, RecordingEngine};
