//! Progressive range fetch for playback.

use crate::config::StorageConfig;
use bytes::Bytes;
use reelvault_common::{FileId, PlaybackError};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Connection timeout for media fetch requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Leading bytes of a media resource plus what the server reports of its
/// total size.
#[derive(Debug, Clone)]
pub struct MediaChunk {
    pub offset: u64,
    pub bytes: Bytes,
    pub total_len: Option<u64>,
}

/// Fetches media with partial-range requests so playback can begin before
/// the full object is downloaded.
pub struct ProgressiveFetcher {
    http: Client,
    api_base: String,
    api_key: String,
    probe_bytes: u64,
}

impl ProgressiveFetcher {
    pub fn new(config: &StorageConfig) -> Self {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            probe_bytes: config.fetch_probe_bytes,
        }
    }

    /// Download URL for a registered file.
    pub fn data_url(&self, file_id: &FileId) -> String {
        format!("{}/files/{}/data", self.api_base, file_id)
    }

    /// Fetch the leading `probe_bytes` of the resource starting at
    /// `offset`.
    ///
    /// The initial partial-range request shortens time-to-first-frame;
    /// subsequent ranges are managed by the media transport, not here.
    pub async fn fetch_head(
        &self,
        file_id: &FileId,
        offset: u64,
        cancel: &CancellationToken,
    ) -> Result<MediaChunk, PlaybackError> {
        let end = offset + self.probe_bytes - 1;
        let request = self
            .http
            .get(self.data_url(file_id))
            .header("Api-Key", &self.api_key)
            .header(RANGE, format!("bytes={}-{}", offset, end))
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(PlaybackError::Network("fetch cancelled".into())),
            response = request => response.map_err(|e| PlaybackError::Network(e.to_string()))?,
        };

        if !response.status().is_success() {
            return Err(PlaybackError::Network(format!(
                "fetch returned status {}",
                response.status()
            )));
        }

        let total_len = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(total_from_content_range);

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(PlaybackError::Network("fetch cancelled".into())),
            bytes = response.bytes() => bytes.map_err(|e| PlaybackError::Network(e.to_string()))?,
        };

        tracing::debug!(
            file_id = %file_id,
            offset,
            len = bytes.len(),
            total_len,
            "Fetched leading media range"
        );

        Ok(MediaChunk {
            offset,
            bytes,
            total_len,
        })
    }
}

/// Total length from a `bytes start-end/total` header, when known.
fn total_from_content_range(value: &str) -> Option<u64> {
    let total = value.strip_prefix("bytes ")?.rsplit('/').next()?;
    if total == "*" {
        None
    } else {
        total.parse().ok()
    }
}
