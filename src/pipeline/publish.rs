use super::status::{PublishStage, PublishStatus};
use crate::compress::{compress_with_retry, Compressor};
use crate::ledger::LedgerPublisher;
use crate::retry::RetryPolicy;
use crate::store::FileIdStore;
use crate::upload::{TransferProgress, UploadSession};
use bytes::Bytes;
use reelvault_common::{CompressionError, MediaHandle, UploadError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Orchestrates one publish job: compress -> upload -> register.
///
/// Holds at most one in-flight job per invocation; serializing concurrent
/// invocations is the caller's responsibility.
pub struct PublishPipeline {
    compressor: Arc<dyn Compressor>,
    uploader: Arc<UploadSession>,
    publisher: Arc<LedgerPublisher>,
    store: Option<Arc<FileIdStore>>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl PublishPipeline {
    pub fn new(
        compressor: Arc<dyn Compressor>,
        uploader: Arc<UploadSession>,
        publisher: Arc<LedgerPublisher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            compressor,
            uploader,
            publisher,
            store: None,
            retry,
            cancel: CancellationToken::new(),
        }
    }

    /// Also record each uploaded file id in a local store.
    pub fn with_store(mut self, store: Arc<FileIdStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Token aborting the in-flight stage of a running job.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort the running job. The active stage's network operation is
    /// cancelled and no further status events are emitted.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Run one publish job for `media`.
    ///
    /// The job runs on its own task; the returned stream yields progress
    /// per stage and terminates with `Published` or `Aborted`.
    pub fn run(&self, media: MediaHandle) -> mpsc::UnboundedReceiver<PublishStatus> {
        let (tx, rx) = mpsc::unbounded_channel();

        let compressor = self.compressor.clone();
        let uploader = self.uploader.clone();
        let publisher = self.publisher.clone();
        let store = self.store.clone();
        let retry = self.retry.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            run_job(compressor, uploader, publisher, store, retry, media, tx, cancel).await;
        });

        rx
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_job(
    compressor: Arc<dyn Compressor>,
    uploader: Arc<UploadSession>,
    publisher: Arc<LedgerPublisher>,
    store: Option<Arc<FileIdStore>>,
    retry: RetryPolicy,
    media: MediaHandle,
    tx: mpsc::UnboundedSender<PublishStatus>,
    cancel: CancellationToken,
) {
    // Stage 1: compress.
    let _ = tx.send(PublishStatus::Compressing {
        attempt: 1,
        progress: 0.0,
    });
    let progress_tx = tx.clone();
    let compressed = match compress_with_retry(
        compressor.as_ref(),
        &media,
        &retry,
        move |attempt, progress| {
            let _ = progress_tx.send(PublishStatus::Compressing { attempt, progress });
        },
        &cancel,
    )
    .await
    {
        Ok(handle) => handle,
        Err(CompressionError::Cancelled) => return,
        Err(e) => {
            let _ = tx.send(PublishStatus::Aborted {
                stage: PublishStage::Compressing,
                reason: e.to_string(),
                remote_file_id: None,
            });
            return;
        }
    };

    // Stage 2: upload. The compressed handle is owned by this stage now.
    let payload = match tokio::fs::read(&compressed.local_path).await {
        Ok(bytes) => Bytes::from(bytes),
        Err(e) => {
            let _ = tx.send(PublishStatus::Aborted {
                stage: PublishStage::Uploading,
                reason: format!("failed to read compressed output: {}", e),
                remote_file_id: None,
            });
            return;
        }
    };
    let metadata = uploader.metadata_for(&compressed.display_name, &compressed.mime_type);

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<TransferProgress>();
    let upload_tx = tx.clone();
    let forward = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            let _ = upload_tx.send(PublishStatus::Uploading {
                uploaded: progress.uploaded,
                total: progress.total,
                percent: progress.percent(),
            });
        }
    });

    let uploaded = uploader
        .upload(payload, &metadata, Some(progress_tx), &cancel)
        .await;
    // Drain remaining progress before any terminal event for this stage.
    let _ = forward.await;

    let file_id = match uploaded {
        Ok(file_id) => file_id,
        Err(UploadError::Cancelled) => return,
        Err(e) => {
            let _ = tx.send(PublishStatus::Aborted {
                stage: PublishStage::Uploading,
                reason: e.to_string(),
                remote_file_id: None,
            });
            return;
        }
    };

    if let Some(store) = &store {
        if let Err(e) = store.record(&file_id).await {
            tracing::warn!(file_id = %file_id, error = %e, "Failed to record file id locally");
        }
    }

    // Stage 3: ledger registration. Only reachable from a succeeded upload.
    let _ = tx.send(PublishStatus::Publishing {
        file_id: file_id.clone(),
    });

    let published = tokio::select! {
        _ = cancel.cancelled() => return,
        result = publisher.publish(&file_id) => result,
    };

    match published {
        Ok(_record) => {
            let _ = tx.send(PublishStatus::Published { file_id });
        }
        Err(e) => {
            // The remote object exists but is unregistered; surface the id
            // so the caller can retry registration without re-uploading.
            let _ = tx.send(PublishStatus::Aborted {
                stage: PublishStage::Publishing,
                reason: e.to_string(),
                remote_file_id: Some(file_id),
            });
        }
    }
}
