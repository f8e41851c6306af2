//! Resumable upload session.

use super::metadata::{file_id_from_resource_url, UploadMetadata};
use crate::config::StorageConfig;
use bytes::Bytes;
use reelvault_common::{FileId, UploadError};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Connection timeout for object-store requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resumable-protocol version sent with every call.
const PROTOCOL_VERSION: &str = "1.0.0";

/// A progress report from an in-flight transfer.
///
/// `uploaded` is monotonically non-decreasing until the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub uploaded: u64,
    pub total: u64,
}

impl TransferProgress {
    /// `uploaded / total` as a percentage, clamped to [0, 100].
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        ((self.uploaded as f64 / self.total as f64) * 100.0).clamp(0.0, 100.0) as f32
    }
}

/// Drives the resumable upload protocol against the object store.
///
/// Failures are surfaced, not retried: whether to retry a network failure
/// is the caller's decision.
pub struct UploadSession {
    client: Client,
    endpoint: String,
    api_key: String,
    vault_id: String,
    chunk_size: usize,
}

impl UploadSession {
    pub fn new(config: &StorageConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: format!("{}/uploads", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            vault_id: config.vault_id.clone(),
            chunk_size: config.upload_chunk_bytes,
        }
    }

    /// Vault the session uploads into.
    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    /// Upload metadata for a handle's display name and MIME type.
    pub fn metadata_for(&self, display_name: &str, mime_type: &str) -> UploadMetadata {
        UploadMetadata::new(display_name, mime_type, &self.vault_id)
    }

    /// Upload `payload`, reporting progress until a terminal outcome.
    ///
    /// A zero-byte payload fails fast with no network call. Cancelling the
    /// token aborts the in-flight transfer; nothing is emitted afterwards.
    pub async fn upload(
        &self,
        payload: Bytes,
        metadata: &UploadMetadata,
        progress: Option<mpsc::UnboundedSender<TransferProgress>>,
        cancel: &CancellationToken,
    ) -> Result<FileId, UploadError> {
        if payload.is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        let total = payload.len() as u64;
        let location = tokio::select! {
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            created = self.create_resource(total, metadata) => created?,
        };
        tracing::debug!(location = %location, total, "Upload resource created");

        let mut offset: u64 = 0;
        while offset < total {
            let end = usize::min(offset as usize + self.chunk_size, payload.len());
            let chunk = payload.slice(offset as usize..end);
            let expected = end as u64;

            let reported = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(offset, "Upload cancelled mid-transfer");
                    return Err(UploadError::Cancelled);
                }
                appended = self.append_chunk(&location, offset, chunk) => appended?,
            };

            if reported != expected {
                return Err(UploadError::OffsetMismatch { expected, reported });
            }
            offset = reported;

            if let Some(tx) = &progress {
                let _ = tx.send(TransferProgress {
                    uploaded: offset,
                    total,
                });
            }
        }

        let file_id = file_id_from_resource_url(&location).ok_or(UploadError::MissingLocation)?;
        tracing::info!(file_id = %file_id, total, "Upload completed");
        Ok(file_id)
    }

    async fn create_resource(
        &self,
        total: u64,
        metadata: &UploadMetadata,
    ) -> Result<String, UploadError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .header("Tus-Resumable", PROTOCOL_VERSION)
            .header("Upload-Length", total.to_string())
            .header("Upload-Metadata", metadata.to_header_value())
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(server_rejection(response).await);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(UploadError::MissingLocation)?;

        // A relative Location resolves against the create endpoint.
        if location.starts_with("http://") || location.starts_with("https://") {
            Ok(location)
        } else {
            Ok(format!(
                "{}/{}",
                self.endpoint.trim_end_matches('/'),
                location.trim_start_matches('/')
            ))
        }
    }

    async fn append_chunk(
        &self,
        location: &str,
        offset: u64,
        chunk: Bytes,
    ) -> Result<u64, UploadError> {
        let response = self
            .client
            .patch(location)
            .header("Api-Key", &self.api_key)
            .header("Tus-Resumable", PROTOCOL_VERSION)
            .header("Upload-Offset", offset.to_string())
            .header(CONTENT_TYPE, "application/offset+octet-stream")
            .body(chunk)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(server_rejection(response).await);
        }

        response
            .headers()
            .get("Upload-Offset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                UploadError::Network("append response missing Upload-Offset header".into())
            })
    }
}

async fn server_rejection(response: reqwest::Response) -> UploadError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    UploadError::ServerRejected { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_clamped() {
        let progress = TransferProgress {
            uploaded: 5,
            total: 10,
        };
        assert_eq!(progress.percent(), 50.0);

        let done = TransferProgress {
            uploaded: 10,
            total: 10,
        };
        assert_eq!(done.percent(), 100.0);

        let empty = TransferProgress {
            uploaded: 0,
            total: 0,
        };
        assert_eq!(empty.percent(), 0.0);
    }

    #[tokio::test]
    async fn test_empty_payload_fails_without_network() {
        // An unroutable endpoint proves no network call is made.
        let config = StorageConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            ..StorageConfig::default()
        };
        let session = UploadSession::new(&config);
        let metadata = session.metadata_for("clip.mp4", "video/mp4");
        let cancel = CancellationToken::new();

        let err = session
            .upload(Bytes::new(), &metadata, None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyPayload));
    }
}
