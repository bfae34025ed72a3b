//! One viewing of one subject (or episode).

use crate::completion::CompletionPolicy;
use crate::config::PlaybackConfig;
use crate::position::ClockReading;
use crate::seek::{SeekArbiter, SeekState};
use playhead_model::{EpisodeId, ProgressCheckpoint, ResumePoint, SubjectId};
use std::time::Instant;

/// Where the session's duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationSource {
    Unknown,
    /// Seeded from the stored resume point; replaced by the engine's value.
    Resume,
    /// Reported by the engine; fixed for the rest of the session.
    Engine,
}

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    subject_id: SubjectId,
    episode_id: Option<EpisodeId>,
    position_seconds: f64,
    duration_seconds: f64,
    duration_source: DurationSource,
    buffered_fraction: f64,
    completed: bool,
    completion: CompletionPolicy,
    pub(crate) seek: SeekArbiter,
    /// Resume offset not yet applied to the engine.
    pending_resume: Option<f64>,
    /// Ticks ignored while waiting to apply `pending_resume`.
    resume_wait_ticks: u32,
    /// Engine duration reported mid-seek, adopted when the seek settles.
    deferred_engine_duration: Option<f64>,
    opened_at: Instant,
    pub(crate) last_attempt_at: Option<Instant>,
    pub(crate) last_persisted_at: Option<Instant>,
    pub(crate) last_persisted: Option<ProgressCheckpoint>,
}

impl PlaybackSession {
    pub fn open(
        subject_id: SubjectId,
        episode_id: Option<EpisodeId>,
        resume: Option<&ResumePoint>,
        opened_at: Instant,
        config: &PlaybackConfig,
    ) -> Self {
        let mut session = Self {
            subject_id,
            episode_id,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            duration_source: DurationSource::Unknown,
            buffered_fraction: 0.0,
            completed: false,
            completion: CompletionPolicy::new(config.completion_threshold),
            seek: SeekArbiter::new(
                config.settle_window(),
                config.seek_clamp_max,
            ),
            pending_resume: None,
            resume_wait_ticks: 0,
            deferred_engine_duration: None,
            opened_at,
            last_attempt_at: None,
            last_persisted_at: None,
            last_persisted: None,
        };

        if let Some(resume) = resume {
            if resume.duration_seconds.is_finite()
                && resume.duration_seconds > 0.0
            {
                session.duration_seconds = resume.duration_seconds;
                session.duration_source = DurationSource::Resume;
            }
            session.position_seconds = session.clamp(resume.position_seconds);
            if session.position_seconds > 0.0 {
                session.pending_resume = Some(session.position_seconds);
            }
        }

        session
    }

    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    pub fn episode_id(&self) -> Option<EpisodeId> {
        self.episode_id
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn duration_source(&self) -> DurationSource {
        self.duration_source
    }

    pub fn buffered_fraction(&self) -> f64 {
        self.buffered_fraction
    }

    pub fn play_ratio(&self) -> f64 {
        self.reading().play_ratio()
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn seek_state(&self) -> SeekState {
        self.seek.state()
    }

    pub fn pending_resume(&self) -> Option<f64> {
        self.pending_resume
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn last_persisted_at(&self) -> Option<Instant> {
        self.last_persisted_at
    }

    pub fn last_persisted(&self) -> Option<&ProgressCheckpoint> {
        self.last_persisted.as_ref()
    }

    /// What a scrubber should show: the gesture target while seeking,
    /// otherwise the trusted position.
    pub fn displayed_position(&self) -> f64 {
        match self.seek.target_fraction() {
            Some(fraction) if self.duration_seconds > 0.0 => {
                fraction * self.duration_seconds
            }
            _ => self.position_seconds,
        }
    }

    pub fn displayed_fraction(&self) -> f64 {
        match self.seek.target_fraction() {
            Some(fraction) => fraction,
            None => self.play_ratio(),
        }
    }

    pub fn reading(&self) -> ClockReading {
        ClockReading {
            position_seconds: self.position_seconds,
            duration_seconds: self.duration_seconds,
            buffered_fraction: self.buffered_fraction,
        }
    }

    /// Snapshot suitable for the progress store, if the session has a usable
    /// duration.
    pub fn checkpoint(&self) -> Option<ProgressCheckpoint> {
        ProgressCheckpoint::new(
            self.subject_id,
            self.episode_id,
            self.position_seconds,
            self.duration_seconds,
            self.completed,
        )
        .ok()
    }

    /// Adopts an engine-reported duration.
    ///
    /// The first engine value replaces a resume-seeded one and is then fixed.
    /// While a seek is in flight the value is held until the seek settles, so
    /// the position does not move under the user's target.
    /// Returns true when the duration was adopted.
    pub(crate) fn adopt_engine_duration(&mut self, duration: f64) -> bool {
        if self.duration_source == DurationSource::Engine
            || !duration.is_finite()
            || duration <= 0.0
        {
            return false;
        }
        if !self.seek.is_idle() {
            self.deferred_engine_duration = Some(duration);
            return false;
        }
        self.lock_engine_duration(duration);
        true
    }

    /// A seek settled on `target_fraction`. Adopts a duration held back
    /// during the seek and rebases the position on the target. Returns true
    /// when a held duration was adopted.
    pub(crate) fn finish_seek(&mut self, target_fraction: f64) -> bool {
        let Some(duration) = self.deferred_engine_duration.take() else {
            return false;
        };
        if self.duration_source == DurationSource::Engine {
            return false;
        }
        self.lock_engine_duration(duration);
        self.position_seconds = self.clamp(target_fraction * duration);
        true
    }

    fn lock_engine_duration(&mut self, duration: f64) {
        self.duration_seconds = duration;
        self.duration_source = DurationSource::Engine;
        self.position_seconds = self.clamp(self.position_seconds);
        if let Some(resume) = self.pending_resume {
            self.pending_resume = Some(self.clamp(resume));
        }
    }

    /// Applies a trusted reading. Returns true if this made the session
    /// complete.
    pub(crate) fn apply_reading(&mut self, reading: ClockReading) -> bool {
        self.position_seconds = self.clamp(reading.position_seconds);
        self.buffered_fraction = reading.buffered_fraction;
        self.refresh_completion()
    }

    /// Moves the trusted position to a committed seek target.
    pub(crate) fn move_to_fraction(&mut self, fraction: f64) -> bool {
        if self.duration_seconds > 0.0 {
            self.position_seconds = self.clamp(fraction * self.duration_seconds);
        }
        self.pending_resume = None;
        self.refresh_completion()
    }

    /// Hands out the resume offset once the engine has a duration.
    ///
    /// With `allow_provisional` a resume-seeded duration is good enough; a
    /// session with no duration at all drops the offset instead.
    pub(crate) fn take_pending_resume(
        &mut self,
        allow_provisional: bool,
    ) -> Option<f64> {
        match self.duration_source {
            DurationSource::Engine => self.pending_resume.take(),
            DurationSource::Resume if allow_provisional => {
                self.pending_resume.take()
            }
            DurationSource::Unknown if allow_provisional => {
                self.pending_resume = None;
                None
            }
            _ => None,
        }
    }

    /// Counts a tick ignored because the resume offset is still pending.
    pub(crate) fn note_resume_wait(&mut self) -> u32 {
        self.resume_wait_ticks = self.resume_wait_ticks.saturating_add(1);
        self.resume_wait_ticks
    }

    fn refresh_completion(&mut self) -> bool {
        let was = self.completed;
        self.completed = self.completion.evaluate(self.play_ratio(), was);
        !was && self.completed
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.duration_seconds > 0.0 {
            seconds.min(self.duration_seconds)
        } else {
            seconds
        }
    }
}
