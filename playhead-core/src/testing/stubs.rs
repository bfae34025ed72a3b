//! In-memory stand-ins for the store, the engine and the executor.

use crate::error::{EngineError, StoreError, StoreResult};
use crate::ports::{PlaybackEngine, ProgressStore, SeekTarget, Spawn};
use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use playhead_model::{ProgressCheckpoint, ResumePoint, SubjectId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<SubjectId, ResumePoint>,
    writes: Vec<ProgressCheckpoint>,
    reads: usize,
    fail_reads: bool,
    fail_writes: usize,
}

/// Progress store backed by a map. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, subject_id: SubjectId, resume: ResumePoint) -> Self {
        self.state.lock().records.insert(subject_id, resume);
        self
    }

    /// Every read fails with a transport error.
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// The next `count` writes fail with a transport error.
    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().fail_writes = count;
    }

    /// Successful writes, oldest first
    pub fn writes(&self) -> Vec<ProgressCheckpoint> {
        self.state.lock().writes.clone()
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    pub fn record(&self, subject_id: SubjectId) -> Option<ResumePoint> {
        self.state.lock().records.get(&subject_id).cloned()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn read_progress(
        &self,
        subject_id: SubjectId,
    ) -> StoreResult<Option<ResumePoint>> {
        let mut state = self.state.lock();
        state.reads += 1;
        if state.fail_reads {
            return Err(StoreError::Transport("connection refused".into()));
        }
        Ok(state.records.get(&subject_id).cloned())
    }

    async fn write_progress(
        &self,
        checkpoint: ProgressCheckpoint,
    ) -> StoreResult<()> {
        let mut state = self.state.lock();
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(StoreError::Transport("connection reset".into()));
        }
        let mut resume = ResumePoint::new(
            checkpoint.whole_position() as f64,
            checkpoint.whole_duration() as f64,
        )
        .with_completed(checkpoint.completed);
        resume.episode_id = checkpoint.episode_id;
        state.records.insert(checkpoint.subject_id, resume);
        state.writes.push(checkpoint);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct EngineState {
    seeks: Vec<SeekTarget>,
    reject: bool,
}

/// Engine that records every seek it is asked to perform.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    state: Arc<Mutex<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeks(&self) -> Vec<SeekTarget> {
        self.state.lock().seeks.clone()
    }

    pub fn last_seek(&self) -> Option<SeekTarget> {
        self.state.lock().seeks.last().copied()
    }

    /// Reject every seek until turned off again.
    pub fn reject_seeks(&self, reject: bool) {
        self.state.lock().reject = reject;
    }
}

impl PlaybackEngine for RecordingEngine {
    fn seek_to(&mut self, target: SeekTarget) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.reject {
            return Err(EngineError::Rejected("media not seekable".into()));
        }
        state.seeks.push(target);
        Ok(())
    }
}

/// Executor that holds spawned tasks until the test runs them.
#[derive(Clone, Default)]
pub struct QueuedSpawner {
    queue: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl std::fmt::Debug for QueuedSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedSpawner")
            .field("pending", &self.pending())
            .finish()
    }
}

impl QueuedSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Runs queued tasks to completion in spawn order. Tasks spawned while
    /// running are left for the next call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let tasks = std::mem::take(&mut *self.queue.lock());
        let count = tasks.len();
        for task in tasks {
            futures::executor::block_on(task);
        }
        count
    }
}

impl Spawn for QueuedSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.queue.lock().push(task);
    }
}
