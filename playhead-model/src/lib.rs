//! Core data model definitions shared across Playhead crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod ids;
pub mod progress;

pub use error::{ModelError, Result};
pub use ids::{EpisodeId, SubjectId};
pub use progress::{ProgressCheckpoint, ResumePoint};
