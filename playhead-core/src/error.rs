use playhead_model::{ModelError, SubjectId};
use thiserror::Error;

/// Errors returned by a [`ProgressStore`](crate::ports::ProgressStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Progress store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode progress response: {0}")]
    Decode(String),

    #[error("Invalid progress record: {0}")]
    Invalid(#[from] ModelError),
}

/// Errors returned by a [`PlaybackEngine`](crate::ports::PlaybackEngine).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine is not ready to seek")]
    NotReady,

    #[error("Engine rejected seek: {0}")]
    Rejected(String),
}

/// Failures the controller recovers from on its own.
///
/// None of these interrupt playback. They are logged where they happen and
/// reported through [`SessionEvent::Fault`](crate::controller::SessionEvent)
/// for hosts that want to surface them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecoveredFault {
    #[error("No resume point for {subject_id}: {reason}")]
    ResumeUnavailable { subject_id: SubjectId, reason: String },

    #[error("Checkpoint write failed: {reason}")]
    CheckpointFailed { reason: String },

    #[error("Engine seek to {target_fraction:.4} failed: {reason}")]
    EngineSeekFailed { target_fraction: f64, reason: String },

    #[error("Engine reported invalid duration {duration}")]
    InvalidDuration { duration: f64 },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
