//! Playback tuning.
//!
//! The defaults match what the media server's web player shipped with. They
//! are empirical, so every one of them can be overridden from a TOML/JSON
//! file or inline JSON in the environment.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_CHECKPOINT_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 200;
pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.9;
/// Seeking exactly to the end makes some engines stop instead of seek.
pub const DEFAULT_SEEK_CLAMP_MAX: f64 = 0.999_999;
pub const DEFAULT_SKIP_STEP_SECONDS: f64 = 5.0;
/// Some engines never report a duration for live or odd containers.
pub const DEFAULT_RESUME_WAIT_TICKS: u32 = 3;

const CONFIG_PATH_VAR: &str = "PLAYHEAD_CONFIG_PATH";
const CONFIG_JSON_VAR: &str = "PLAYHEAD_CONFIG_JSON";

/// Source that produced the playback configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("checkpoint_interval_ms must be greater than zero")]
    ZeroCheckpointInterval,

    #[error("completion_threshold must be within (0, 1], got {0}")]
    CompletionThreshold(f64),

    #[error("seek_clamp_max must be within (0, 1), got {0}")]
    SeekClamp(f64),

    #[error("skip_step_seconds must be positive, got {0}")]
    SkipStep(f64),
}

/// Timing and threshold settings for a playback session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Minimum spacing (ms) between checkpoint attempts. A failed write waits
    /// a full interval before the next attempt.
    pub checkpoint_interval_ms: u64,
    /// Grace window (ms) after a seek commit during which engine ticks are
    /// ignored. Raise it for engines with slow seeks (network streams).
    pub settle_window_ms: u64,
    /// Play ratio at which a session counts as watched.
    pub completion_threshold: f64,
    /// Upper bound for seek fractions.
    pub seek_clamp_max: f64,
    /// Step used by relative skip commands.
    pub skip_step_seconds: f64,
    /// Engine ticks without a duration to wait before resuming against the
    /// stored duration instead.
    pub resume_wait_ticks: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval_ms: DEFAULT_CHECKPOINT_INTERVAL_MS,
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            seek_clamp_max: DEFAULT_SEEK_CLAMP_MAX,
            skip_step_seconds: DEFAULT_SKIP_STEP_SECONDS,
            resume_wait_ticks: DEFAULT_RESUME_WAIT_TICKS,
        }
    }
}

impl PlaybackConfig {
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_interval_ms)
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_interval_ms == 0 {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        if !(self.completion_threshold > 0.0
            && self.completion_threshold <= 1.0)
        {
            return Err(ConfigError::CompletionThreshold(
                self.completion_threshold,
            ));
        }
        if !(self.seek_clamp_max > 0.0 && self.seek_clamp_max < 1.0) {
            return Err(ConfigError::SeekClamp(self.seek_clamp_max));
        }
        if !(self.skip_step_seconds.is_finite() && self.skip_step_seconds > 0.0)
        {
            return Err(ConfigError::SkipStep(self.skip_step_seconds));
        }
        Ok(())
    }

    /// Load overrides using environment variables.
    /// Evaluation order:
    /// 1) `$PLAYHEAD_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$PLAYHEAD_CONFIG_JSON` (inline JSON),
    /// 3) a default file in the working directory,
    /// 4) defaults.
    pub fn load_from_env() -> anyhow::Result<(Self, PlaybackConfigSource)> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`load_from_env`](Self::load_from_env) with an explicit
    /// variable lookup.
    pub fn load_with<F>(
        lookup: F,
    ) -> anyhow::Result<(Self, PlaybackConfigSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path_str) = lookup(CONFIG_PATH_VAR)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str.trim());
            let config = Self::load_from_file(&path)?;
            return Ok((config, PlaybackConfigSource::EnvPath(path)));
        }

        if let Some(raw) = lookup(CONFIG_JSON_VAR)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_VAR}"))?;
            return Ok((parsed, PlaybackConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            return Ok((config, PlaybackConfigSource::File(path)));
        }

        Ok((Self::default(), PlaybackConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read playback config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid playback config {}", path.display())
            }),
            Some("toml") => {
                let config: Self = toml::from_str(&contents).map_err(|err| {
                    anyhow!(
                        "invalid playback config {}: {}",
                        path.display(),
                        err
                    )
                })?;
                config.validate()?;
                Ok(config)
            }
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> anyhow::Result<Self> {
        // Try TOML first, then JSON for convenience.
        let config: Self = toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse playback config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid playback config json: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] =
            &["playhead.toml", "playhead.json", "config/playhead.toml"];

        CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.checkpoint_interval(), Duration::from_secs(10));
        assert_eq!(config.settle_window(), Duration::from_millis(200));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = PlaybackConfig::parse_from_str(
            "settle_window_ms = 350\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.settle_window_ms, 350);
        assert_eq!(config.checkpoint_interval_ms, 10_000);
        assert_eq!(config.completion_threshold, 0.9);
        assert_eq!(config.resume_wait_ticks, DEFAULT_RESUME_WAIT_TICKS);
    }

    #[test]
    fn json_is_accepted_when_toml_fails() {
        let config = PlaybackConfig::parse_from_str(
            r#"{"completion_threshold": 0.95}"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.completion_threshold, 0.95);
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let config = PlaybackConfig {
            checkpoint_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCheckpointInterval));

        let config = PlaybackConfig {
            completion_threshold: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CompletionThreshold(1.5))
        );

        let config = PlaybackConfig {
            seek_clamp_max: 1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SeekClamp(1.0)));

        let config = PlaybackConfig {
            skip_step_seconds: -5.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SkipStep(-5.0)));
    }

    #[test]
    fn invalid_inline_json_is_an_error() {
        let err = PlaybackConfig::parse_json(r#"{"seek_clamp_max": 2.0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("seek_clamp_max"));
    }

    #[test]
    fn env_path_takes_precedence_over_inline_json() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "checkpoint_interval_ms = 15000").unwrap();
        let path = file.path().to_path_buf();

        let (config, source) = PlaybackConfig::load_with(|key| match key {
            CONFIG_PATH_VAR => Some(path.display().to_string()),
            CONFIG_JSON_VAR => Some(r#"{"checkpoint_interval_ms": 1}"#.into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.checkpoint_interval_ms, 15_000);
        assert_eq!(source, PlaybackConfigSource::EnvPath(path));
    }

    #[test]
    fn inline_json_is_used_without_path() {
        let (config, source) = PlaybackConfig::load_with(|key| match key {
            CONFIG_JSON_VAR => Some(r#"{"skip_step_seconds": 10.0}"#.into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.skip_step_seconds, 10.0);
        assert_eq!(source, PlaybackConfigSource::EnvInline);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PlaybackConfig::load_from_file(Path::new(
            "/nonexistent/playhead.toml",
        ))
        .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/playhead.toml"));
    }
}
