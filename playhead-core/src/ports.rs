//! Collaborators the controller talks to.
//!
//! The progress store and the playback engine live outside this crate (an HTTP
//! media server and a video widget, typically). [`Spawn`] lets the host decide
//! where background checkpoint writes run.

use crate::error::{EngineError, StoreResult};
use async_trait::async_trait;
use futures::future::BoxFuture;
use playhead_model::{ProgressCheckpoint, ResumePoint, SubjectId};

/// Remote persistence for watch progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fetch the stored resume point for a subject, `None` if never watched.
    async fn read_progress(
        &self,
        subject_id: SubjectId,
    ) -> StoreResult<Option<ResumePoint>>;

    /// Persist a checkpoint.
    async fn write_progress(
        &self,
        checkpoint: ProgressCheckpoint,
    ) -> StoreResult<()>;
}

/// Where an engine seek should land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// Fraction of the total duration in `[0, 1)`
    Fraction(f64),
    /// Absolute offset in seconds
    Seconds(f64),
}

/// The video/audio engine being driven.
pub trait PlaybackEngine: Send {
    fn seek_to(&mut self, target: SeekTarget) -> Result<(), EngineError>;
}

/// Runs detached background work (checkpoint writes).
pub trait Spawn: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// [`Spawn`] backed by a tokio runtime handle.
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Spawner for the runtime the caller is running on, if any.
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl Spawn for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        // Detached; completion is reported through the task's own channel.
        drop(self.handle.spawn(task));
    }
}
