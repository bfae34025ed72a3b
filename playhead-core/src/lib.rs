//! Playhead core
//!
//! Tracks the playhead of a single viewing session: reconciles engine
//! progress ticks with user seek gestures, persists watch progress on a
//! timer, and decides when a session counts as watched.
//!
//! The entry point is [`controller::PlaybackSessionController`]. It talks to
//! the outside world only through the traits in [`ports`], so the same code
//! drives a UI event loop, a headless test, or the tokio actor in [`driver`].
//!
//! Notes
//! - Handlers are synchronous and assume serialized dispatch.
//! - Progress writes run on the host's executor and are reported back on the
//!   next timer tick.

#![allow(missing_docs)]

pub mod checkpoint;
pub mod completion;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod ports;
pub mod position;
pub mod seek;
pub mod session;
/// In-memory ports and a hand-driven clock for tests and demos
pub mod testing;
pub mod time;

pub use playhead_model;

pub mod prelude {
    pub use crate::checkpoint::{CheckpointDecision, SkipReason, WriteOutcome};
    pub use crate::completion::CompletionPolicy;
    pub use crate::config::{PlaybackConfig, PlaybackConfigSource};
    pub use crate::controller::{PlaybackSessionController, SessionEvent};
    pub use crate::driver::{SessionHandle, spawn_session_driver};
    pub use crate::error::{EngineError, RecoveredFault, StoreError};
    pub use crate::ports::{
        PlaybackEngine, ProgressStore, SeekTarget, Spawn, TokioSpawner,
    };
    pub use crate::position::{ClockReading, EngineTick, PositionClock};
    pub use crate::seek::{SeekArbiter, SeekState};
    pub use crate::session::{DurationSource, PlaybackSession};
    pub use crate::time::{Clock, SystemClock};
    pub use playhead_model::{
        EpisodeId, ProgressCheckpoint, ResumePoint, SubjectId,
    };
}
