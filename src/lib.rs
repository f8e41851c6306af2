//! Reelvault - resilient media publish pipeline and adaptive playback.
//!
//! The publish path compresses a local video, streams it to a vault at the
//! object store over a resumable-upload protocol, and registers the
//! resulting file id on an append-only ledger. The playback path fetches
//! registered ids progressively and manages buffering thresholds, load
//! timeouts, and visibility-driven play/pause per session.

pub mod compress;
pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod playback;
pub mod retry;
pub mod store;
pub mod upload;

pub use reelvault_common::{
    CompressionError, ConfigError, FileId, LedgerError, MediaHandle, NaturalDimensions,
    NetworkType, PlaybackError, PresentationMode, SessionId, StoreError, UploadError, Viewport,
};
