//! Wire shapes of the progress API.
//!
//! The server stores whole seconds as 32-bit integers and identifies media by
//! string ids.

use chrono::{DateTime, Utc};
use playhead_model::{EpisodeId, ModelError, ProgressCheckpoint, ResumePoint};
use serde::{Deserialize, Serialize};

/// Stored progress row returned by `GET /progress/{media_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WatchProgressDto {
    pub id: String,
    pub user_id: String,
    pub media_id: String,
    pub episode_id: Option<String>,
    pub position: i32,
    pub duration: i32,
    pub watched_at: DateTime<Utc>,
    pub completed: bool,
}

/// Body of `POST /progress`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateProgressDto {
    pub user_id: String,
    pub media_id: String,
    pub episode_id: Option<String>,
    pub position: i32,
    pub duration: i32,
    /// The server derives the flag from the ratio when this is absent.
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressQuery<'a> {
    pub user_id: &'a str,
}

impl TryFrom<WatchProgressDto> for ResumePoint {
    type Error = ModelError;

    fn try_from(dto: WatchProgressDto) -> Result<Self, Self::Error> {
        let episode_id = dto
            .episode_id
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(EpisodeId::parse)
            .transpose()?;
        Ok(ResumePoint {
            episode_id,
            position_seconds: f64::from(dto.position),
            duration_seconds: f64::from(dto.duration),
            completed: dto.completed,
            watched_at: Some(dto.watched_at),
        })
    }
}

impl UpdateProgressDto {
    pub fn from_checkpoint(
        user_id: &str,
        checkpoint: &ProgressCheckpoint,
    ) -> Result<Self, ModelError> {
        let whole = |value: i64, what: &str| {
            i32::try_from(value).map_err(|_| {
                ModelError::InvalidProgress(format!(
                    "{what} {value}s does not fit the progress API"
                ))
            })
        };
        Ok(Self {
            user_id: user_id.to_string(),
            media_id: checkpoint.subject_id.as_str(),
            episode_id: checkpoint.episode_id.map(|id| id.as_str()),
            position: whole(checkpoint.whole_position(), "position")?,
            duration: whole(checkpoint.whole_duration(), "duration")?,
            completed: Some(checkpoint.completed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playhead_model::SubjectId;

    fn row(episode_id: Option<&str>) -> WatchProgressDto {
        WatchProgressDto {
            id: "wp-1".into(),
            user_id: "default-user".into(),
            media_id: SubjectId::new().as_str(),
            episode_id: episode_id.map(str::to_string),
            position: 120,
            duration: 600,
            watched_at: Utc::now(),
            completed: false,
        }
    }

    #[test]
    fn row_becomes_resume_point() {
        let point = ResumePoint::try_from(row(None)).unwrap();
        assert_eq!(point.position_seconds, 120.0);
        assert_eq!(point.duration_seconds, 600.0);
        assert!(point.watched_at.is_some());
    }

    #[test]
    fn malformed_episode_id_is_rejected() {
        assert!(ResumePoint::try_from(row(Some("not-a-uuid"))).is_err());
        assert!(ResumePoint::try_from(row(Some(""))).unwrap().episode_id.is_none());
    }

    #[test]
    fn checkpoint_is_sent_in_whole_seconds() {
        let checkpoint = ProgressCheckpoint::new(
            SubjectId::new(),
            Some(EpisodeId::new()),
            95.8,
            1440.4,
            false,
        )
        .unwrap();
        let body = UpdateProgressDto::from_checkpoint("default-user", &checkpoint)
            .unwrap();
        assert_eq!(body.position, 95);
        assert_eq!(body.duration, 1440);
        assert_eq!(body.completed, Some(false));
        assert_eq!(body.media_id, checkpoint.subject_id.to_string());

        let json = serde_json::to_value(&body).unwrap();
        assert!(json["position"].is_i64());
    }
}
