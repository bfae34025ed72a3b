//! Shared harness for controller integration tests
//!
//! Wires a [`PlaybackSessionController`] to in-memory ports and a manual
//! clock so every test controls time and background writes explicitly.

#![allow(dead_code)]

use playhead_core::checkpoint::CheckpointDecision;
use playhead_core::config::PlaybackConfig;
use playhead_core::controller::{PlaybackSessionController, SessionEvent};
use playhead_core::testing::{
    ManualClock, MemoryProgressStore, QueuedSpawner, RecordingEngine,
};
use playhead_core::time::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub struct Harness {
    pub controller: PlaybackSessionController,
    pub clock: ManualClock,
    pub store: MemoryProgressStore,
    pub engine: RecordingEngine,
    pub spawner: QueuedSpawner,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryProgressStore::new())
    }

    pub fn with_store(store: MemoryProgressStore) -> Self {
        Self::with_config(store, PlaybackConfig::default())
    }

    pub fn with_config(store: MemoryProgressStore, config: PlaybackConfig) -> Self {
        init_tracing();
        let clock = ManualClock::new();
        let engine = RecordingEngine::new();
        let spawner = QueuedSpawner::new();
        let controller = PlaybackSessionController::new(
            Arc::new(store.clone()),
            Box::new(engine.clone()),
            Arc::new(spawner.clone()),
            Arc::new(clock.clone()),
            config,
        );
        Self {
            controller,
            clock,
            store,
            engine,
            spawner,
        }
    }

    pub fn advance_ms(&self, millis: u64) {
        self.clock.advance(Duration::from_millis(millis));
    }

    pub fn advance_secs(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    /// Fires the host checkpoint timer at the current manual time.
    pub fn timer(&mut self) -> Option<CheckpointDecision> {
        let now = self.clock.now();
        self.controller.on_timer_tick(now)
    }

    pub fn events(&mut self) -> Vec<SessionEvent> {
        self.controller.drain_events()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
