//! Watch progress records exchanged with the progress store.
//!
//! [`ResumePoint`] is what the store hands back when a player opens a subject;
//! [`ProgressCheckpoint`] is what the player writes back while watching.

use crate::error::ModelError;
use crate::ids::{EpisodeId, SubjectId};
use chrono::{DateTime, Utc};

/// Stored progress for a subject, used to resume playback.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResumePoint {
    /// Episode the record belongs to, if the subject is a series
    pub episode_id: Option<EpisodeId>,
    /// Last persisted playback offset in seconds
    pub position_seconds: f64,
    /// Duration known when the record was written
    pub duration_seconds: f64,
    pub completed: bool,
    /// When the record was last written, if the store tracks it
    pub watched_at: Option<DateTime<Utc>>,
}

impl ResumePoint {
    pub fn new(position_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            episode_id: None,
            position_seconds,
            duration_seconds,
            completed: false,
            watched_at: None,
        }
    }

    pub fn with_episode(mut self, episode_id: EpisodeId) -> Self {
        self.episode_id = Some(episode_id);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Whether the record can seed a session for `episode_id`.
    ///
    /// Records for another episode of the same series, and records with
    /// nonsensical numbers, are not usable.
    pub fn applies_to(&self, episode_id: Option<EpisodeId>) -> bool {
        self.episode_id == episode_id
            && self.position_seconds.is_finite()
            && self.position_seconds >= 0.0
            && self.duration_seconds.is_finite()
    }

    pub fn play_ratio(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Snapshot of a session written to the progress store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressCheckpoint {
    pub subject_id: SubjectId,
    pub episode_id: Option<EpisodeId>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub completed: bool,
}

impl ProgressCheckpoint {
    /// Builds a checkpoint, rejecting values the media server refuses
    /// (negative position, non-positive duration).
    pub fn new(
        subject_id: SubjectId,
        episode_id: Option<EpisodeId>,
        position_seconds: f64,
        duration_seconds: f64,
        completed: bool,
    ) -> crate::Result<Self> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(ModelError::InvalidProgress(format!(
                "duration must be positive, got {duration_seconds}"
            )));
        }
        if !position_seconds.is_finite() || position_seconds < 0.0 {
            return Err(ModelError::InvalidProgress(format!(
                "position must be non-negative, got {position_seconds}"
            )));
        }

        Ok(Self {
            subject_id,
            episode_id,
            position_seconds: position_seconds.min(duration_seconds),
            duration_seconds,
            completed,
        })
    }

    /// Position truncated to whole seconds, as stored by the server.
    pub fn whole_position(&self) -> i64 {
        self.position_seconds.floor() as i64
    }

    /// Duration truncated to whole seconds, as stored by the server.
    pub fn whole_duration(&self) -> i64 {
        self.duration_seconds.floor() as i64
    }

    /// True when both checkpoints would produce the same stored row.
    pub fn same_stored_state(&self, other: &ProgressCheckpoint) -> bool {
        self.subject_id == other.subject_id
            && self.episode_id == other.episode_id
            && self.whole_position() == other.whole_position()
            && self.whole_duration() == other.whole_duration()
            && self.completed == other.completed
    }
}
