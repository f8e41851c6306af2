//! Adaptive playback.
//!
//! For a registered file id: progressive fetch with an initial partial
//! range, network-aware buffering thresholds, a single-shot load timeout
//! with bounded reload retries, and visibility-driven play/pause.

mod fetch;
mod machine;
mod manager;
mod session;

pub use fetch::{MediaChunk, ProgressiveFetcher};
pub use machine::{PlaybackController, PlaybackEffect, PlaybackEvent, PlaybackState};
pub use manager::PlaybackSessionManager;
pub use session::{MediaSurface, PlaybackSession};
