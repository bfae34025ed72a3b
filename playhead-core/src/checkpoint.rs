//! Periodic persistence of playback position.
//!
//! The host calls [`Checkpointer::maybe_checkpoint`] from its timer. Writes run
//! on the host's [`Spawn`] implementation and report back through a oneshot
//! channel that is polled on the next call, so session state is only ever
//! touched by the caller.

use crate::error::StoreError;
use crate::ports::{ProgressStore, Spawn};
use crate::session::PlaybackSession;
use futures::channel::oneshot;
use futures::future::FutureExt;
use playhead_model::ProgressCheckpoint;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Why no write was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Seeking,
    UnknownDuration,
    NotDue,
    AtStart,
    Unchanged,
}

/// Result of one [`Checkpointer::maybe_checkpoint`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointDecision {
    Started(ProgressCheckpoint),
    Skipped(SkipReason),
}

/// A finished background write.
#[derive(Debug)]
pub enum WriteOutcome {
    Saved(ProgressCheckpoint),
    Failed {
        checkpoint: ProgressCheckpoint,
        error: StoreError,
    },
}

struct InFlightWrite {
    checkpoint: ProgressCheckpoint,
    done: oneshot::Receiver<Result<(), StoreError>>,
}

pub struct Checkpointer {
    interval: Duration,
    store: Arc<dyn ProgressStore>,
    spawner: Arc<dyn Spawn>,
    in_flight: Option<InFlightWrite>,
    finished: Vec<WriteOutcome>,
}

impl std::fmt::Debug for Checkpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpointer")
            .field("interval", &self.interval)
            .field(
                "in_flight",
                &self.in_flight.as_ref().map(|w| &w.checkpoint),
            )
            .field("finished", &self.finished.len())
            .finish()
    }
}

impl Checkpointer {
    pub fn new(
        interval: Duration,
        store: Arc<dyn ProgressStore>,
        spawner: Arc<dyn Spawn>,
    ) -> Self {
        Self {
            interval,
            store,
            spawner,
            in_flight: None,
            finished: Vec::new(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Collects the result of a finished write, if any, into the session.
    pub fn reap(&mut self, session: &mut PlaybackSession, now: Instant) {
        let Some(write) = self.in_flight.as_mut() else {
            return;
        };

        let result = match write.done.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(oneshot::Canceled) => Err(StoreError::Transport(
                "write task dropped before completing".to_string(),
            )),
        };

        let Some(write) = self.in_flight.take() else {
            return;
        };
        match result {
            Ok(()) => {
                debug!(
                    target: "playhead::checkpoint",
                    subject_id = %write.checkpoint.subject_id,
                    position = write.checkpoint.position_seconds,
                    "checkpoint saved"
                );
                session.last_persisted_at = Some(now);
                session.last_persisted = Some(write.checkpoint.clone());
                self.finished.push(WriteOutcome::Saved(write.checkpoint));
            }
            Err(error) => {
                warn!(
                    target: "playhead::checkpoint",
                    subject_id = %write.checkpoint.subject_id,
                    error = %error,
                    "checkpoint write failed, retrying next interval"
                );
                self.finished.push(WriteOutcome::Failed {
                    checkpoint: write.checkpoint,
                    error,
                });
            }
        }
    }

    /// Outcomes collected by [`reap`](Self::reap) since the last drain.
    pub fn drain_outcomes(&mut self) -> Vec<WriteOutcome> {
        std::mem::take(&mut self.finished)
    }

    /// Starts a write if the session is idle, has a duration, and the
    /// interval since the last attempt has elapsed.
    pub fn maybe_checkpoint(
        &mut self,
        session: &mut PlaybackSession,
        now: Instant,
    ) -> CheckpointDecision {
        self.reap(session, now);

        if self.in_flight.is_some() {
            return CheckpointDecision::Skipped(SkipReason::InFlight);
        }
        if !session.seek.is_idle() {
            return CheckpointDecision::Skipped(SkipReason::Seeking);
        }
        if session.duration_seconds() <= 0.0 {
            return CheckpointDecision::Skipped(SkipReason::UnknownDuration);
        }

        let since = session.last_attempt_at.unwrap_or(session.opened_at());
        if now.saturating_duration_since(since) < self.interval {
            return CheckpointDecision::Skipped(SkipReason::NotDue);
        }
        if session.position_seconds() <= 0.0 {
            return CheckpointDecision::Skipped(SkipReason::AtStart);
        }

        let Some(checkpoint) = session.checkpoint() else {
            return CheckpointDecision::Skipped(SkipReason::UnknownDuration);
        };
        if session
            .last_persisted
            .as_ref()
            .is_some_and(|last| last.same_stored_state(&checkpoint))
        {
            return CheckpointDecision::Skipped(SkipReason::Unchanged);
        }

        session.last_attempt_at = Some(now);
        self.start_write(checkpoint.clone());
        CheckpointDecision::Started(checkpoint)
    }

    /// Final best-effort write on teardown. Not retried and not awaited.
    ///
    /// Runs after any write still in flight so the final state lands last.
    pub fn finish(self, session: &PlaybackSession) -> Option<ProgressCheckpoint> {
        let checkpoint = session.checkpoint()?;
        if checkpoint.position_seconds <= 0.0 {
            return None;
        }

        let superseded = self
            .in_flight
            .as_ref()
            .map(|w| &w.checkpoint)
            .or(session.last_persisted.as_ref())
            .is_some_and(|last| last.same_stored_state(&checkpoint));
        if superseded {
            debug!(
                target: "playhead::checkpoint",
                subject_id = %checkpoint.subject_id,
                "final checkpoint matches last write, skipping"
            );
            return None;
        }

        let previous = self.in_flight.map(|w| w.done);
        let store = Arc::clone(&self.store);
        let final_checkpoint = checkpoint.clone();
        self.spawner.spawn(
            async move {
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                let subject_id = final_checkpoint.subject_id;
                match store.write_progress(final_checkpoint).await {
                    Ok(()) => debug!(
                        target: "playhead::checkpoint",
                        %subject_id,
                        "final checkpoint saved"
                    ),
                    Err(error) => warn!(
                        target: "playhead::checkpoint",
                        %subject_id,
                        error = %error,
                        "final checkpoint failed"
                    ),
                }
            }
            .boxed(),
        );

        Some(checkpoint)
    }

    fn start_write(&mut self, checkpoint: ProgressCheckpoint) {
        let (tx, rx) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let payload = checkpoint.clone();
        self.spawner.spawn(
            async move {
                let result = store.write_progress(payload).await;
                // Receiver is gone if the session closed meanwhile.
                let _ = tx.send(result);
            }
            .boxed(),
        );
        self.in_flight = Some(InFlightWrite {
            checkpoint,
            done: rx,
        });
    }
}
