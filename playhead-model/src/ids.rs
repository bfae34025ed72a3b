use crate::error::ModelError;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of the media item being played (movie, show, track).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SubjectId(pub Uuid);

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl SubjectId {
    pub fn new() -> Self {
        SubjectId(Uuid::now_v7())
    }

    pub fn parse(raw: &str) -> crate::Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(SubjectId)
            .map_err(|_| ModelError::InvalidId {
                kind: "subject",
                raw: raw.to_string(),
            })
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for SubjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an episode when the subject is a series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EpisodeId(pub Uuid);

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeId {
    pub fn new() -> Self {
        EpisodeId(Uuid::now_v7())
    }

    pub fn parse(raw: &str) -> crate::Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(EpisodeId)
            .map_err(|_| ModelError::InvalidId {
                kind: "episode",
                raw: raw.to_string(),
            })
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for EpisodeId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
