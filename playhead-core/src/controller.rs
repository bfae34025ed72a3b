//! Playback session controller.
//!
//! Owns the active [`PlaybackSession`] and is the single entry point for every
//! event that can change it: engine ticks, user seek gestures and the host's
//! checkpoint timer. Handlers assume serialized dispatch (a UI event loop or
//! the actor in [`crate::driver`]); the controller is not internally
//! synchronized.
//!
//! ```no_run
//! # async fn demo(
//! #     store: std::sync::Arc<dyn playhead_core::ports::ProgressStore>,
//! #     engine: Box<dyn playhead_core::ports::PlaybackEngine>,
//! # ) {
//! use playhead_core::prelude::*;
//! use std::sync::Arc;
//!
//! let spawner = Arc::new(TokioSpawner::try_current().unwrap());
//! let mut controller = PlaybackSessionController::new(
//!     store,
//!     engine,
//!     spawner,
//!     Arc::new(SystemClock),
//!     PlaybackConfig::default(),
//! );
//!
//! controller.open(SubjectId::new(), None).await;
//! controller.on_engine_tick(EngineTick::at_seconds(12.0, 600.0));
//! controller.on_timer_tick(controller.now());
//! controller.close();
//! # }
//! ```

use crate::checkpoint::{CheckpointDecision, Checkpointer, WriteOutcome};
use crate::config::PlaybackConfig;
use crate::error::RecoveredFault;
use crate::ports::{PlaybackEngine, ProgressStore, SeekTarget, Spawn};
use crate::position::{EngineTick, PositionClock};
use crate::session::PlaybackSession;
use crate::time::Clock;
use playhead_model::{EpisodeId, ProgressCheckpoint, SubjectId};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Notifications for a UI layer, collected with
/// [`PlaybackSessionController::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Opened {
        subject_id: SubjectId,
        episode_id: Option<EpisodeId>,
        resume_at: Option<f64>,
    },
    /// Play ratio crossed the completion threshold.
    Completed { subject_id: SubjectId },
    /// A seek left its settle window; ticks are trusted again.
    SeekSettled { position_seconds: f64 },
    CheckpointSaved(ProgressCheckpoint),
    Fault(RecoveredFault),
    Closed {
        subject_id: SubjectId,
        final_checkpoint: Option<ProgressCheckpoint>,
    },
}

struct ActiveSession {
    session: PlaybackSession,
    checkpointer: Checkpointer,
}

pub struct PlaybackSessionController {
    config: PlaybackConfig,
    store: Arc<dyn ProgressStore>,
    engine: Box<dyn PlaybackEngine>,
    spawner: Arc<dyn Spawn>,
    clock: Arc<dyn Clock>,
    active: Option<ActiveSession>,
    events: Vec<SessionEvent>,
}

impl std::fmt::Debug for PlaybackSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSessionController")
            .field("config", &self.config)
            .field("session", &self.active.as_ref().map(|a| &a.session))
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl PlaybackSessionController {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        engine: Box<dyn PlaybackEngine>,
        spawner: Arc<dyn Spawn>,
        clock: Arc<dyn Clock>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            spawner,
            clock,
            active: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn displayed_position(&self) -> f64 {
        self.session()
            .map(PlaybackSession::displayed_position)
            .unwrap_or(0.0)
    }

    pub fn displayed_fraction(&self) -> f64 {
        self.session()
            .map(PlaybackSession::displayed_fraction)
            .unwrap_or(0.0)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Starts a session, closing the current one first.
    ///
    /// A missing or unreadable resume point starts playback at 0.
    pub async fn open(
        &mut self,
        subject_id: SubjectId,
        episode_id: Option<EpisodeId>,
    ) -> &PlaybackSession {
        if self.active.is_some() {
            self.close();
        }

        let store = Arc::clone(&self.store);
        let resume = match store.read_progress(subject_id).await {
            Ok(Some(point)) if point.applies_to(episode_id) => Some(point),
            Ok(Some(_)) => {
                self.fault(RecoveredFault::ResumeUnavailable {
                    subject_id,
                    reason: "stored progress belongs to another episode"
                        .to_string(),
                });
                None
            }
            Ok(None) => {
                debug!(
                    target: "playhead::session",
                    %subject_id,
                    "no stored progress"
                );
                self.events.push(SessionEvent::Fault(
                    RecoveredFault::ResumeUnavailable {
                        subject_id,
                        reason: "no stored progress".to_string(),
                    },
                ));
                None
            }
            Err(error) => {
                self.fault(RecoveredFault::ResumeUnavailable {
                    subject_id,
                    reason: error.to_string(),
                });
                None
            }
        };

        let session = PlaybackSession::open(
            subject_id,
            episode_id,
            resume.as_ref(),
            self.clock.now(),
            &self.config,
        );
        info!(
            target: "playhead::session",
            %subject_id,
            episode_id = ?episode_id,
            position = session.position_seconds(),
            duration = session.duration_seconds(),
            "playback session opened"
        );
        self.events.push(SessionEvent::Opened {
            subject_id,
            episode_id,
            resume_at: session.pending_resume(),
        });

        let checkpointer = Checkpointer::new(
            self.config.checkpoint_interval(),
            Arc::clone(&self.store),
            Arc::clone(&self.spawner),
        );
        let active = self.active.insert(ActiveSession {
            session,
            checkpointer,
        });
        &active.session
    }

    /// Dedicated duration report from the engine.
    pub fn on_engine_duration(&mut self, duration_seconds: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            self.fault(RecoveredFault::InvalidDuration {
                duration: duration_seconds,
            });
            return;
        }
        if active.session.adopt_engine_duration(duration_seconds) {
            debug!(
                target: "playhead::session",
                duration = duration_seconds,
                "engine duration adopted"
            );
        }
        self.apply_pending_resume(false);
    }

    /// Periodic progress report from the engine.
    pub fn on_engine_tick(&mut self, tick: EngineTick) {
        let now = self.clock.now();
        if self.active.is_none() {
            trace!(target: "playhead::session", "tick without session");
            return;
        }
        self.settle(now);

        match PositionClock::engine_duration(&tick) {
            Some(duration) => {
                if let Some(active) = self.active.as_mut() {
                    active.session.adopt_engine_duration(duration);
                }
                self.apply_pending_resume(false);
            }
            None => {
                if let Some(reported) = tick.duration_seconds
                    && self.session().is_some_and(|s| s.duration_seconds() <= 0.0)
                {
                    self.fault(RecoveredFault::InvalidDuration {
                        duration: reported,
                    });
                }
            }
        }

        let Some(active) = self.active.as_mut() else {
            return;
        };
        let session = &mut active.session;
        if !session.seek.is_idle() {
            trace!(
                target: "playhead::seek",
                played_seconds = tick.played_seconds,
                "tick ignored while seeking"
            );
            return;
        }
        if session.pending_resume().is_some() {
            // Engine has not been moved to the resume point yet.
            let waited = session.note_resume_wait();
            if waited < self.config.resume_wait_ticks {
                trace!(
                    target: "playhead::session",
                    waited,
                    "tick ignored until resume is applied"
                );
                return;
            }
            warn!(
                target: "playhead::session",
                waited,
                "engine reported no duration; resuming against stored duration"
            );
            self.apply_pending_resume(true);
            return;
        }

        let reading = PositionClock::read(&tick, session.reading());
        if session.apply_reading(reading) {
            self.mark_completed();
        }
    }

    /// Scrubber pointer-down.
    pub fn on_seek_start(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let current = active.session.displayed_fraction();
        active.session.seek.begin(current);
    }

    /// Scrubber moved to `fraction`.
    pub fn on_seek_to(&mut self, fraction: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.session.seek.drag(fraction);
    }

    /// Scrubber released at `fraction`; the engine seek is issued here.
    pub fn on_seek_commit(&mut self, fraction: f64) {
        let now = self.clock.now();
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let target = active.session.seek.commit(fraction, now);
        let completed = active.session.move_to_fraction(target);
        if completed {
            self.mark_completed();
        }
        self.issue_seek(SeekTarget::Fraction(target), target);
    }

    /// Discrete jump to a fraction of the duration.
    pub fn jump_to_fraction(&mut self, fraction: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let current = active.session.displayed_fraction();
        active.session.seek.begin(current);
        self.on_seek_commit(fraction);
    }

    /// Digit shortcut: `0` jumps to the start, `9` to 90 %.
    pub fn jump_to_percent_digit(&mut self, digit: u8) -> bool {
        if digit > 9 {
            return false;
        }
        self.jump_to_fraction(f64::from(digit) / 10.0);
        true
    }

    /// Relative skip from the displayed position.
    pub fn skip_by(&mut self, seconds: f64) {
        let Some(session) = self.session() else {
            return;
        };
        let duration = session.duration_seconds();
        if duration <= 0.0 || !seconds.is_finite() {
            debug!(target: "playhead::seek", "skip ignored without duration");
            return;
        }
        let target = (session.displayed_position() + seconds).clamp(0.0, duration);
        self.jump_to_fraction(target / duration);
    }

    pub fn skip_forward(&mut self) {
        self.skip_by(self.config.skip_step_seconds);
    }

    pub fn skip_backward(&mut self) {
        self.skip_by(-self.config.skip_step_seconds);
    }

    /// Host timer. Settles expired seeks and runs the checkpointer.
    pub fn on_timer_tick(&mut self, now: Instant) -> Option<CheckpointDecision> {
        self.active.as_ref()?;
        self.settle(now);

        let active = self.active.as_mut()?;
        let decision = active
            .checkpointer
            .maybe_checkpoint(&mut active.session, now);
        let outcomes = active.checkpointer.drain_outcomes();
        self.record_outcomes(outcomes);

        if let CheckpointDecision::Started(checkpoint) = &decision {
            debug!(
                target: "playhead::checkpoint",
                subject_id = %checkpoint.subject_id,
                position = checkpoint.position_seconds,
                completed = checkpoint.completed,
                "checkpoint started"
            );
        }
        Some(decision)
    }

    /// Ends the session with a final best-effort checkpoint.
    pub fn close(&mut self) -> Option<ProgressCheckpoint> {
        let now = self.clock.now();
        let ActiveSession {
            mut session,
            mut checkpointer,
        } = self.active.take()?;

        session.seek.cancel();
        checkpointer.reap(&mut session, now);
        let outcomes = checkpointer.drain_outcomes();
        self.record_outcomes(outcomes);

        let final_checkpoint = checkpointer.finish(&session);
        info!(
            target: "playhead::session",
            subject_id = %session.subject_id(),
            position = session.position_seconds(),
            completed = session.completed(),
            "playback session closed"
        );
        self.events.push(SessionEvent::Closed {
            subject_id: session.subject_id(),
            final_checkpoint: final_checkpoint.clone(),
        });
        final_checkpoint
    }

    fn settle(&mut self, now: Instant) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if let Some(target_fraction) = active.session.seek.poll(now) {
            if active.session.finish_seek(target_fraction) {
                debug!(
                    target: "playhead::session",
                    duration = active.session.duration_seconds(),
                    "engine duration adopted after seek"
                );
            }
            self.events.push(SessionEvent::SeekSettled {
                position_seconds: active.session.position_seconds(),
            });
        }
    }

    /// Seeks the engine to the stored resume offset. A user seek in progress
    /// wins and the offset stays pending.
    fn apply_pending_resume(&mut self, allow_provisional: bool) {
        let now = self.clock.now();
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !active.session.seek.is_idle() {
            return;
        }
        let Some(resume_at) =
            active.session.take_pending_resume(allow_provisional)
        else {
            return;
        };
        let duration = active.session.duration_seconds();
        let current = active.session.displayed_fraction();
        active.session.seek.begin(current);
        let target = active.session.seek.commit(resume_at / duration, now);
        if active.session.move_to_fraction(target) {
            self.mark_completed();
        }
        info!(
            target: "playhead::session",
            resume_at,
            "resuming playback"
        );
        let seconds = (target * duration).min(resume_at);
        self.issue_seek(SeekTarget::Seconds(seconds), target);
    }

    fn issue_seek(&mut self, target: SeekTarget, target_fraction: f64) {
        if let Err(error) = self.engine.seek_to(target) {
            // The arbiter still settles on its deadline.
            self.fault(RecoveredFault::EngineSeekFailed {
                target_fraction,
                reason: error.to_string(),
            });
        }
    }

    fn mark_completed(&mut self) {
        let Some(session) = self.session() else {
            return;
        };
        let subject_id = session.subject_id();
        info!(
            target: "playhead::session",
            %subject_id,
            ratio = session.play_ratio(),
            "subject completed"
        );
        self.events.push(SessionEvent::Completed { subject_id });
    }

    fn record_outcomes(&mut self, outcomes: Vec<WriteOutcome>) {
        for outcome in outcomes {
            match outcome {
                WriteOutcome::Saved(checkpoint) => {
                    self.events.push(SessionEvent::CheckpointSaved(checkpoint));
                }
                WriteOutcome::Failed { error, .. } => {
                    self.events.push(SessionEvent::Fault(
                        RecoveredFault::CheckpointFailed {
                            reason: error.to_string(),
                        },
                    ));
                }
            }
        }
    }

    fn fault(&mut self, fault: RecoveredFault) {
        warn!(target: "playhead::session", %fault, "recovered playback fault");
        self.events.push(SessionEvent::Fault(fault));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        ManualClock, MemoryProgressStore, QueuedSpawner, RecordingEngine,
    };
    use futures::executor::block_on;

    fn controller() -> (PlaybackSessionController, RecordingEngine) {
        let engine = RecordingEngine::new();
        let controller = PlaybackSessionController::new(
            Arc::new(MemoryProgressStore::new()),
            Box::new(engine.clone()),
            Arc::new(QueuedSpawner::new()),
            Arc::new(ManualClock::new()),
            PlaybackConfig::default(),
        );
        (controller, engine)
    }

    #[test]
    fn invalid_duration_is_reported_and_ignored() {
        let (mut controller, _) = controller();
        block_on(controller.open(SubjectId::new(), None));
        controller.drain_events();

        controller.on_engine_duration(f64::NAN);
        controller.on_engine_tick(EngineTick {
            played_seconds: 3.0,
            duration_seconds: Some(0.0),
            ..EngineTick::default()
        });

        let events = controller.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(
            e,
            SessionEvent::Fault(RecoveredFault::InvalidDuration { .. })
        )));
        assert_eq!(controller.session().map(|s| s.duration_seconds()), Some(0.0));
    }

    #[test]
    fn events_without_session_are_dropped() {
        let (mut controller, engine) = controller();
        controller.on_engine_tick(EngineTick::at_seconds(10.0, 100.0));
        controller.on_engine_duration(100.0);
        controller.jump_to_fraction(0.5);
        assert!(controller.on_timer_tick(controller.now()).is_none());
        assert!(controller.close().is_none());
        assert!(controller.drain_events().is_empty());
        assert!(engine.seeks().is_empty());
    }

    #[test]
    fn open_reports_resume_offset() {
        let (mut controller, _) = controller();
        let subject = SubjectId::new();
        let session = block_on(controller.open(subject, None));
        assert!(session.pending_resume().is_none());
        assert!(matches!(
            controller.drain_events().last(),
            Some(SessionEvent::Opened { subject_id, resume_at: None, .. })
                if *subject_id == subject
        ));
    }
}
