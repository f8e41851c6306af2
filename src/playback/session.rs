//! Async host that drives a playback controller.
//!
//! The session owns the event loop: it executes the machine's effects
//! (progressive fetch, single-shot timers, play/pause calls against the
//! media surface) and feeds resulting events back in. Destroying a session
//! cancels its pending timer and any in-flight fetch.

use super::fetch::{MediaChunk, ProgressiveFetcher};
use super::machine::{PlaybackController, PlaybackEffect, PlaybackEvent, PlaybackState};
use crate::config::PlaybackConfig;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use parking_lot::Mutex;
use reelvault_common::{FileId, NaturalDimensions, NetworkType, PlaybackError, PresentationMode, SessionId, Viewport};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

/// Decoder/renderer collaborator the session drives.
///
/// Play and pause failures are swallowed and logged by the session, so
/// rapid visibility toggles can never raise an uncaught failure.
#[async_trait]
pub trait MediaSurface: Send + Sync {
    /// Feed the fetched leading bytes; resolves with the natural
    /// dimensions once media metadata is parsed.
    async fn load(&self, chunk: MediaChunk) -> Result<NaturalDimensions, PlaybackError>;

    async fn play(&self) -> Result<(), PlaybackError>;

    async fn pause(&self) -> Result<(), PlaybackError>;

    /// Release the current media resource.
    async fn unload(&self);
}

/// One playback session for one remote file.
pub struct PlaybackSession {
    id: SessionId,
    file_id: FileId,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    controller: Arc<Mutex<PlaybackController>>,
    cancel: CancellationToken,
    driver: JoinHandle<()>,
}

impl PlaybackSession {
    /// Spawn the session's driver task.
    pub fn spawn(
        file_id: FileId,
        network: NetworkType,
        fetcher: Arc<ProgressiveFetcher>,
        surface: Arc<dyn MediaSurface>,
        config: &PlaybackConfig,
        retry: &RetryPolicy,
    ) -> Self {
        let controller = Arc::new(Mutex::new(PlaybackController::new(
            file_id.clone(),
            network,
            config,
        )));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let driver = tokio::spawn(drive(
            controller.clone(),
            events_rx,
            events_tx.clone(),
            fetcher,
            surface,
            Duration::from_millis(config.load_timeout_ms),
            Box::new(retry.delays()),
            retry.max_delay(),
            cancel.clone(),
            file_id.clone(),
        ));

        Self {
            id: SessionId::new(),
            file_id,
            events: events_tx,
            controller,
            cancel,
            driver,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.lock().state()
    }

    pub fn retry_count(&self) -> u32 {
        self.controller.lock().retry_count()
    }

    pub fn presentation(&self, viewport: Viewport) -> Option<PresentationMode> {
        self.controller.lock().presentation(viewport)
    }

    /// Mark the session as the one that should load.
    pub fn start(&self) {
        let _ = self.events.send(PlaybackEvent::ShouldLoad);
    }

    /// Route the externally supplied visibility flag.
    pub fn set_visible(&self, visible: bool) {
        let _ = self.events.send(PlaybackEvent::VisibilityChanged { visible });
    }

    /// The media transport reports buffered duration.
    pub fn report_buffered(&self, buffered_ms: u64) {
        let _ = self.events.send(PlaybackEvent::BufferProgress { buffered_ms });
    }

    /// The media transport reports a mid-playback decode/stream error.
    pub fn report_decode_error(&self, reason: &str) {
        let _ = self.events.send(PlaybackEvent::DecodeFailed {
            reason: reason.to_string(),
        });
    }

    /// Stop the driver, cancelling the pending timer and in-flight fetch.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.driver.abort();
    }
}

struct DriverContext {
    events: mpsc::UnboundedSender<PlaybackEvent>,
    fetcher: Arc<ProgressiveFetcher>,
    surface: Arc<dyn MediaSurface>,
    load_timeout: Duration,
    retry_delays: Box<dyn Iterator<Item = Duration> + Send>,
    /// Fallback once the schedule is exhausted (the machine normally caps
    /// attempts first).
    fallback_delay: Duration,
    cancel: CancellationToken,
    file_id: FileId,
}

/// In-flight progressive fetch, abortable as a unit.
struct FetchState {
    guard: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl FetchState {
    fn abort(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.cancel();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Single-shot wall-clock timer; `None` never fires.
type SingleShot = Option<Pin<Box<Sleep>>>;

async fn fire(timer: &mut SingleShot) {
    match timer.as_mut() {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive(
    controller: Arc<Mutex<PlaybackController>>,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    fetcher: Arc<ProgressiveFetcher>,
    surface: Arc<dyn MediaSurface>,
    load_timeout: Duration,
    retry_delays: Box<dyn Iterator<Item = Duration> + Send>,
    fallback_delay: Duration,
    cancel: CancellationToken,
    file_id: FileId,
) {
    let mut ctx = DriverContext {
        events: events_tx,
        fetcher,
        surface,
        load_timeout,
        retry_delays,
        fallback_delay,
        cancel: cancel.clone(),
        file_id,
    };
    let mut load_timer: SingleShot = None;
    let mut retry_timer: SingleShot = None;
    let mut fetch = FetchState {
        guard: None,
        task: None,
    };

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = fire(&mut load_timer) => {
                load_timer = None;
                PlaybackEvent::LoadTimedOut
            }
            _ = fire(&mut retry_timer) => {
                retry_timer = None;
                PlaybackEvent::RetryDelayElapsed
            }
        };

        let effects = controller.lock().handle(event);
        apply_effects(
            effects,
            &mut load_timer,
            &mut retry_timer,
            &mut fetch,
            &mut ctx,
        )
        .await;
    }

    // The session is gone: nothing it started may keep running.
    fetch.abort();
}

async fn apply_effects(
    effects: Vec<PlaybackEffect>,
    load_timer: &mut SingleShot,
    retry_timer: &mut SingleShot,
    fetch: &mut FetchState,
    ctx: &mut DriverContext,
) {
    for effect in effects {
        match effect {
            PlaybackEffect::StartFetch { offset } => {
                fetch.abort();

                let guard = ctx.cancel.child_token();
                fetch.guard = Some(guard.clone());
                let fetcher = ctx.fetcher.clone();
                let surface = ctx.surface.clone();
                let events = ctx.events.clone();
                let file_id = ctx.file_id.clone();
                fetch.task = Some(tokio::spawn(async move {
                    let outcome = match fetcher.fetch_head(&file_id, offset, &guard).await {
                        Ok(chunk) => surface.load(chunk).await,
                        Err(e) => Err(e),
                    };
                    if guard.is_cancelled() {
                        return;
                    }
                    let event = match outcome {
                        Ok(dims) => PlaybackEvent::MetadataLoaded {
                            width: dims.width,
                            height: dims.height,
                        },
                        Err(e) => PlaybackEvent::FetchFailed {
                            reason: e.to_string(),
                        },
                    };
                    let _ = events.send(event);
                }));
            }
            PlaybackEffect::StartLoadTimer => {
                *load_timer = Some(Box::pin(tokio::time::sleep(ctx.load_timeout)));
            }
            PlaybackEffect::CancelLoadTimer => {
                *load_timer = None;
            }
            PlaybackEffect::UnloadMedia => {
                fetch.abort();
                ctx.surface.unload().await;
            }
            PlaybackEffect::ScheduleRetry { attempt } => {
                let delay = ctx.retry_delays.next().unwrap_or(ctx.fallback_delay);
                tracing::info!(
                    file_id = %ctx.file_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling playback reload"
                );
                *retry_timer = Some(Box::pin(tokio::time::sleep(delay)));
            }
            PlaybackEffect::Play => {
                if let Err(e) = ctx.surface.play().await {
                    tracing::warn!(file_id = %ctx.file_id, error = %e, "Play request failed");
                }
            }
            PlaybackEffect::Pause => {
                if let Err(e) = ctx.surface.pause().await {
                    tracing::warn!(file_id = %ctx.file_id, error = %e, "Pause request failed");
                }
            }
            PlaybackEffect::ReportFailure { reason } => {
                tracing::error!(file_id = %ctx.file_id, reason = %reason, "Playback failed permanently");
            }
        }
    }
}
