//! Media compression stage.
//!
//! Transforms a local media handle into a compressed, streaming-friendly
//! handle. A single [`Compressor`] call makes exactly one attempt; the
//! bounded retry policy lives in [`compress_with_retry`].

mod ffmpeg;
mod settings;

pub use ffmpeg::FfmpegCompressor;
pub use settings::CompressionSettings;

use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reelvault_common::{CompressionError, MediaHandle};
use tokio_util::sync::CancellationToken;

/// Progress callback reporting a fraction in [0, 1].
pub type ProgressCallback = Box<dyn Fn(f32) + Send + Sync>;

/// A media compressor.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress `input` into a new local handle.
    ///
    /// Progress is reported as a fraction in [0, 1] and reaches 1.0 exactly
    /// once, on success. The output file lands in the compressor's scratch
    /// area; the caller owns cleanup of the input once compression succeeds.
    async fn compress(
        &self,
        input: &MediaHandle,
        on_progress: &(dyn Fn(f32) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<MediaHandle, CompressionError>;
}

/// Run `compressor` under the bounded retry policy.
///
/// Each attempt reuses the same input and settings. `on_progress` receives
/// `(attempt, progress)` pairs; attempts are numbered from 1. Once the
/// budget is spent the last failure is folded into
/// [`CompressionError::Exhausted`].
pub async fn compress_with_retry(
    compressor: &dyn Compressor,
    input: &MediaHandle,
    policy: &RetryPolicy,
    on_progress: impl Fn(u32, f32) + Send + Sync,
    cancel: &CancellationToken,
) -> Result<MediaHandle, CompressionError> {
    let mut delays = policy.delays();
    let mut attempt: u32 = 1;

    loop {
        let report = |progress: f32| on_progress(attempt, progress);
        match compressor.compress(input, &report, cancel).await {
            Ok(output) => return Ok(output),
            Err(CompressionError::Cancelled) => return Err(CompressionError::Cancelled),
            Err(err) => match delays.next() {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Compression attempt failed, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(CompressionError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                None => {
                    tracing::error!(attempts = attempt, error = %err, "Compression retries exhausted");
                    return Err(CompressionError::Exhausted {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Compressor that fails a scripted number of times before succeeding.
    struct FlakyCompressor {
        failures: AtomicU32,
        output: MediaHandle,
    }

    impl FlakyCompressor {
        fn new(failures: u32) -> Self {
            Self {
                failures: AtomicU32::new(failures),
                output: MediaHandle::new("/tmp/out.mp4", "out.mp4", "video/mp4"),
            }
        }
    }

    #[async_trait]
    impl Compressor for FlakyCompressor {
        async fn compress(
            &self,
            _input: &MediaHandle,
            on_progress: &(dyn Fn(f32) + Send + Sync),
            _cancel: &CancellationToken,
        ) -> Result<MediaHandle, CompressionError> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
                on_progress(0.3);
                return Err(CompressionError::Transcode("encoder crashed".into()));
            }
            on_progress(0.5);
            on_progress(1.0);
            Ok(self.output.clone())
        }
    }

    fn input() -> MediaHandle {
        MediaHandle::new("/tmp/in.mov", "in.mov", "video/quicktime")
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let compressor = FlakyCompressor::new(2);
        let policy = RetryPolicy::default();
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let seen = attempts.clone();

        let cancel = CancellationToken::new();
        let output = compress_with_retry(
            &compressor,
            &input(),
            &policy,
            move |attempt, progress| seen.lock().push((attempt, progress)),
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(output.mime_type, "video/mp4");
        let attempts = attempts.lock();
        // Two failed attempts, then the successful third reaching 1.0.
        assert_eq!(
            *attempts,
            vec![(1, 0.3), (2, 0.3), (3, 0.5), (3, 1.0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_terminal() {
        let compressor = FlakyCompressor::new(u32::MAX);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
        };

        let cancel = CancellationToken::new();
        let err = compress_with_retry(&compressor, &input(), &policy, |_, _| {}, &cancel)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            CompressionError::Exhausted { attempts: 3, .. }
        );
        assert!(err.is_exhausted());
    }

    #[tokio::test]
    async fn test_cancellation_stops_retrying() {
        let compressor = FlakyCompressor::new(u32::MAX);
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = compress_with_retry(&compressor, &input(), &policy, |_, _| {}, &cancel)
            .await
            .unwrap_err();
        assert_matches!(err, CompressionError::Cancelled);
    }
}
