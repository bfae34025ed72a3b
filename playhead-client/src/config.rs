//! Connection settings for the progress API.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_USER_ID: &str = "default-user";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, including any path prefix (`/api`)
    pub base_url: String,
    /// User the progress records belong to
    pub user_id: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parses `base_url`, adding `http://` when no scheme is given and
    /// dropping a trailing slash.
    pub fn parsed_base_url(&self) -> anyhow::Result<Url> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let with_scheme = if trimmed.starts_with("http://")
            || trimmed.starts_with("https://")
        {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        if with_scheme != self.base_url {
            warn!(
                original = %self.base_url,
                normalized = %with_scheme,
                "normalized progress API base URL"
            );
        }

        let url = Url::parse(&with_scheme)
            .with_context(|| format!("invalid base URL {with_scheme:?}"))?;
        if url.cannot_be_a_base() {
            bail!("base URL {with_scheme:?} cannot have path segments");
        }
        Ok(url)
    }
}
