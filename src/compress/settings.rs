use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Streaming-friendly transcode settings.
///
/// A fixed configuration record passed through to the compressor; the
/// pipeline makes no quality guarantees beyond handing these over.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompressionSettings {
    /// Maximum width (default: 1280).
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum height (default: 720).
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Target video bitrate in bits per second (default: 2 Mbps).
    #[serde(default = "default_bitrate")]
    pub bitrate: u64,

    /// Keyframe interval in seconds (default: 2).
    #[serde(default = "default_keyframe_interval")]
    pub keyframe_interval: f64,

    /// Video codec (default: h264).
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Relocate the container index so playback can start before the
    /// download completes (default: true).
    #[serde(default = "default_faststart")]
    pub faststart: bool,

    /// Scratch directory for compressed output files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_max_width() -> u32 {
    1280
}
fn default_max_height() -> u32 {
    720
}
fn default_bitrate() -> u64 {
    2_000_000
}
fn default_keyframe_interval() -> f64 {
    2.0
}
fn default_codec() -> String {
    "h264".to_string()
}
fn default_faststart() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("reelvault")
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            bitrate: default_bitrate(),
            keyframe_interval: default_keyframe_interval(),
            codec: default_codec(),
            faststart: default_faststart(),
            output_dir: default_output_dir(),
        }
    }
}

impl CompressionSettings {
    /// Map the configured codec name to an encoder.
    pub fn encoder(&self) -> &str {
        match self.codec.as_str() {
            "h264" => "libx264",
            "hevc" | "h265" => "libx265",
            other => other,
        }
    }
}
