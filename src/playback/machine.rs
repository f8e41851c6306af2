//! Playback controller state machine.
//!
//! A pure value object: [`PlaybackController::handle`] maps an event to a
//! new state plus a list of effects for the host to execute. No I/O
//! happens here, which keeps every transition deterministic and unit
//! testable without a media backend.

use crate::config::PlaybackConfig;
use reelvault_common::{FileId, NaturalDimensions, NetworkType, PresentationMode, Viewport};

/// Playback session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Buffering,
    Ready,
    Playing,
    Paused,
    Retrying,
    Failed,
}

/// Inputs to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The session became the one that should load (visible or pre-visible).
    ShouldLoad,
    /// Initial media metadata parsed successfully.
    MetadataLoaded { width: u32, height: u32 },
    /// The media transport reports buffered duration.
    BufferProgress { buffered_ms: u64 },
    /// No successful load callback arrived within the timeout window.
    LoadTimedOut,
    /// The progressive fetch failed.
    FetchFailed { reason: String },
    /// Mid-playback decode/stream error.
    DecodeFailed { reason: String },
    /// The backoff delay before a reload has elapsed.
    RetryDelayElapsed,
    /// Externally supplied visibility flag changed.
    VisibilityChanged { visible: bool },
}

/// Side effects for the host to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEffect {
    /// Issue the progressive fetch from the given byte offset.
    StartFetch { offset: u64 },
    /// Arm the single-shot load timeout.
    StartLoadTimer,
    /// Disarm the load timeout (success path; a stale timer must not fire).
    CancelLoadTimer,
    /// Release the current media resource.
    UnloadMedia,
    /// Wait out the backoff delay for this reload attempt, then report
    /// `RetryDelayElapsed`.
    ScheduleRetry { attempt: u32 },
    /// Start or resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// The retry budget is spent; the session is terminally failed.
    ReportFailure { reason: String },
}

/// Pure state machine for one playback session.
///
/// The network type is sampled once at construction; the buffering
/// threshold derived from it is re-evaluated against every buffer
/// progress event but the sample itself is never refreshed.
#[derive(Debug)]
pub struct PlaybackController {
    file_id: FileId,
    network: NetworkType,
    threshold_cellular_ms: u64,
    threshold_default_ms: u64,
    max_reloads: u32,
    state: PlaybackState,
    retry_count: u32,
    visible: bool,
    buffered_ms: u64,
    dimensions: Option<NaturalDimensions>,
}

impl PlaybackController {
    pub fn new(file_id: FileId, network: NetworkType, config: &PlaybackConfig) -> Self {
        Self {
            file_id,
            network,
            threshold_cellular_ms: config.ready_threshold_cellular_ms,
            threshold_default_ms: config.ready_threshold_default_ms,
            max_reloads: config.max_reloads,
            state: PlaybackState::Idle,
            retry_count: 0,
            visible: false,
            buffered_ms: 0,
            dimensions: None,
        }
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn buffered_ms(&self) -> u64 {
        self.buffered_ms
    }

    pub fn dimensions(&self) -> Option<NaturalDimensions> {
        self.dimensions
    }

    /// Buffered duration required before the session becomes Ready.
    pub fn ready_threshold_ms(&self) -> u64 {
        if self.network.is_cellular() {
            self.threshold_cellular_ms
        } else {
            self.threshold_default_ms
        }
    }

    /// Presentation mode for the captured dimensions inside `viewport`.
    pub fn presentation(&self, viewport: Viewport) -> Option<PresentationMode> {
        self.dimensions
            .map(|dims| PresentationMode::select(dims, viewport))
    }

    /// Apply one event, returning the effects the host must execute.
    pub fn handle(&mut self, event: PlaybackEvent) -> Vec<PlaybackEffect> {
        use PlaybackState::*;

        if self.state == Failed {
            // Terminal; only visibility bookkeeping survives.
            if let PlaybackEvent::VisibilityChanged { visible } = event {
                self.visible = visible;
            }
            return Vec::new();
        }

        match event {
            PlaybackEvent::ShouldLoad => match self.state {
                Idle => {
                    self.state = Loading;
                    vec![
                        PlaybackEffect::StartFetch { offset: 0 },
                        PlaybackEffect::StartLoadTimer,
                    ]
                }
                _ => Vec::new(),
            },

            PlaybackEvent::MetadataLoaded { width, height } => match self.state {
                Loading => {
                    self.dimensions = Some(NaturalDimensions::new(width, height));
                    self.state = Buffering;
                    vec![PlaybackEffect::CancelLoadTimer]
                }
                _ => Vec::new(),
            },

            PlaybackEvent::BufferProgress { buffered_ms } => {
                self.buffered_ms = buffered_ms;
                match self.state {
                    Buffering if buffered_ms >= self.ready_threshold_ms() => {
                        if self.visible {
                            self.state = Playing;
                            vec![PlaybackEffect::Play]
                        } else {
                            self.state = Ready;
                            Vec::new()
                        }
                    }
                    Ready if buffered_ms < self.ready_threshold_ms() => {
                        self.state = Buffering;
                        Vec::new()
                    }
                    _ => Vec::new(),
                }
            }

            PlaybackEvent::LoadTimedOut => match self.state {
                // Only meaningful while waiting on the initial load; a
                // stale timer firing later is swallowed.
                Loading => self.retry_or_fail("load timed out"),
                _ => Vec::new(),
            },

            PlaybackEvent::FetchFailed { reason } => match self.state {
                Loading | Buffering | Ready | Playing | Paused => self.retry_or_fail(&reason),
                _ => Vec::new(),
            },

            PlaybackEvent::DecodeFailed { reason } => match self.state {
                Loading | Buffering | Ready | Playing | Paused => self.retry_or_fail(&reason),
                _ => Vec::new(),
            },

            PlaybackEvent::RetryDelayElapsed => match self.state {
                Retrying => {
                    self.state = Loading;
                    vec![
                        PlaybackEffect::StartFetch { offset: 0 },
                        PlaybackEffect::StartLoadTimer,
                    ]
                }
                _ => Vec::new(),
            },

            PlaybackEvent::VisibilityChanged { visible } => {
                self.visible = visible;
                match (self.state, visible) {
                    (Ready, true) | (Paused, true) => {
                        self.state = Playing;
                        vec![PlaybackEffect::Play]
                    }
                    (Playing, false) => {
                        self.state = Paused;
                        vec![PlaybackEffect::Pause]
                    }
                    // Already in the target state: no redundant call.
                    _ => Vec::new(),
                }
            }
        }
    }

    /// Reload from byte zero with an incremented retry count, or fail
    /// terminally once the budget is spent.
    fn retry_or_fail(&mut self, reason: &str) -> Vec<PlaybackEffect> {
        if self.retry_count >= self.max_reloads {
            self.state = PlaybackState::Failed;
            return vec![
                PlaybackEffect::CancelLoadTimer,
                PlaybackEffect::UnloadMedia,
                PlaybackEffect::ReportFailure {
                    reason: format!("{} (after {} reloads)", reason, self.retry_count),
                },
            ];
        }

        self.retry_count += 1;
        self.buffered_ms = 0;
        self.state = PlaybackState::Retrying;
        vec![
            PlaybackEffect::CancelLoadTimer,
            PlaybackEffect::UnloadMedia,
            PlaybackEffect::ScheduleRetry {
                attempt: self.retry_count,
            },
        ]
    }
}
