//! Playback session registry.
//!
//! One session per media item in the mount set: created when an item
//! becomes the subject of playback interest, destroyed when it scrolls
//! out. Destruction cancels the session's timers and in-flight fetch.

use super::fetch::ProgressiveFetcher;
use super::machine::PlaybackState;
use super::session::{MediaSurface, PlaybackSession};
use crate::config::PlaybackConfig;
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reelvault_common::{FileId, NetworkType, SessionId};
use std::sync::Arc;

struct ManagedSession {
    session: PlaybackSession,
    started_at: DateTime<Utc>,
}

/// Thread-safe registry of live playback sessions, keyed by file id.
#[derive(Clone)]
pub struct PlaybackSessionManager {
    sessions: Arc<DashMap<FileId, ManagedSession>>,
    fetcher: Arc<ProgressiveFetcher>,
    playback: PlaybackConfig,
    retry: RetryPolicy,
}

impl PlaybackSessionManager {
    pub fn new(
        fetcher: Arc<ProgressiveFetcher>,
        playback: PlaybackConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            fetcher,
            playback,
            retry,
        }
    }

    /// Create the session for an item entering the mount set and start
    /// loading. Replaces any previous session for the same file.
    ///
    /// The network type is sampled by the caller once, here, and fixed for
    /// the session's lifetime.
    pub fn mount(
        &self,
        file_id: FileId,
        network: NetworkType,
        surface: Arc<dyn MediaSurface>,
    ) -> SessionId {
        let session = PlaybackSession::spawn(
            file_id.clone(),
            network,
            self.fetcher.clone(),
            surface,
            &self.playback,
            &self.retry,
        );
        session.start();
        let session_id = session.id();

        tracing::info!(
            session_id = %session_id,
            file_id = %file_id,
            network = %network,
            "Mounted playback session"
        );

        self.sessions.insert(
            file_id,
            ManagedSession {
                session,
                started_at: Utc::now(),
            },
        );

        session_id
    }

    /// Route a visibility change to the item's session.
    pub fn set_visible(&self, file_id: &FileId, visible: bool) -> bool {
        match self.sessions.get(file_id) {
            Some(managed) => {
                managed.session.set_visible(visible);
                true
            }
            None => false,
        }
    }

    /// Route a buffered-duration report to the item's session.
    pub fn report_buffered(&self, file_id: &FileId, buffered_ms: u64) -> bool {
        match self.sessions.get(file_id) {
            Some(managed) => {
                managed.session.report_buffered(buffered_ms);
                true
            }
            None => false,
        }
    }

    /// Route a decode error to the item's session.
    pub fn report_decode_error(&self, file_id: &FileId, reason: &str) -> bool {
        match self.sessions.get(file_id) {
            Some(managed) => {
                managed.session.report_decode_error(reason);
                true
            }
            None => false,
        }
    }

    /// Current state of the item's session, if mounted.
    pub fn state(&self, file_id: &FileId) -> Option<PlaybackState> {
        self.sessions.get(file_id).map(|m| m.session.state())
    }

    /// Destroy the session for an item leaving the mount set.
    pub fn unmount(&self, file_id: &FileId) -> bool {
        if let Some((_, managed)) = self.sessions.remove(file_id) {
            managed.session.shutdown();
            tracing::info!(
                session_id = %managed.session.id(),
                file_id = %file_id,
                duration_secs = (Utc::now() - managed.started_at).num_seconds(),
                "Unmounted playback session"
            );
            true
        } else {
            false
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
