use crate::config::ClientConfig;
use crate::dto::{ProgressQuery, UpdateProgressDto, WatchProgressDto};
use anyhow::Context;
use async_trait::async_trait;
use playhead_core::error::{StoreError, StoreResult};
use playhead_core::ports::ProgressStore;
use playhead_model::{ProgressCheckpoint, ResumePoint, SubjectId};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

/// [`ProgressStore`] backed by the media server's HTTP API.
#[derive(Clone)]
pub struct HttpProgressStore {
    client: Client,
    base_url: Url,
    user_id: String,
}

impl std::fmt::Debug for HttpProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProgressStore")
            .field("base_url", &self.base_url.as_str())
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl HttpProgressStore {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let base_url = config.parsed_base_url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build HTTP client")?;

        info!(
            base_url = %base_url,
            user_id = %config.user_id,
            "creating progress store client"
        );

        Ok(Self {
            client,
            base_url,
            user_id: config.user_id.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// `{base}/progress[/{segment}]` with each segment percent-encoded.
    fn progress_url(&self, segment: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                StoreError::Transport(format!(
                    "base URL {} cannot have path segments",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().push("progress");
            if let Some(segment) = segment {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ProgressStore for HttpProgressStore {
    async fn read_progress(
        &self,
        subject_id: SubjectId,
    ) -> StoreResult<Option<ResumePoint>> {
        let url = self.progress_url(Some(&subject_id.as_str()))?;
        let request = self.client.get(url).query(&ProgressQuery {
            user_id: &self.user_id,
        });

        let response = self.execute(request).await?;
        let row: Option<WatchProgressDto> = Self::decode(response).await?;
        debug!(%subject_id, found = row.is_some(), "progress fetched");

        Ok(row.map(ResumePoint::try_from).transpose()?)
    }

    async fn write_progress(
        &self,
        checkpoint: ProgressCheckpoint,
    ) -> StoreResult<()> {
        let body = UpdateProgressDto::from_checkpoint(&self.user_id, &checkpoint)?;
        let url = self.progress_url(None)?;

        self.execute(self.client.post(url).json(&body)).await?;
        debug!(
            subject_id = %checkpoint.subject_id,
            position = body.position,
            duration = body.duration,
            completed = checkpoint.completed,
            "progress saved"
        );
        Ok(())
    }
}
