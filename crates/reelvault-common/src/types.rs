//! Core domain types shared by the publish and playback paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Handle to a media file on local storage.
///
/// Immutable once produced. Ownership transfers stage to stage through the
/// publish pipeline; no stage retains a handle after handing it off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    /// Absolute path of the media file on local storage.
    pub local_path: PathBuf,
    /// Human-readable name, used as the upload filename.
    pub display_name: String,
    /// MIME type of the media content.
    pub mime_type: String,
}

impl MediaHandle {
    pub fn new<P: Into<PathBuf>, S: Into<String>, M: Into<String>>(
        local_path: P,
        display_name: S,
        mime_type: M,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            display_name: display_name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Active network connection type, sampled once per playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Cellular data connection (higher buffering threshold applies).
    Cellular,
    /// Local wireless connection.
    Wifi,
    /// Wired or otherwise fast connection.
    Wired,
    /// Connection type could not be determined.
    Unknown,
}

impl NetworkType {
    /// Whether the stricter cellular buffering threshold applies.
    pub fn is_cellular(&self) -> bool {
        matches!(self, Self::Cellular)
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cellular => write!(f, "cellular"),
            Self::Wifi => write!(f, "wifi"),
            Self::Wired => write!(f, "wired"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Natural pixel dimensions of a media item, captured on metadata load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalDimensions {
    pub width: u32,
    pub height: u32,
}

impl NaturalDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Vertical media is at least as tall as it is wide.
    pub fn is_vertical(&self) -> bool {
        self.height >= self.width
    }
}

/// Viewport the playback surface renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How a media item should be presented inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    /// Vertical media fills the viewport as-is.
    Natural,
    /// Horizontal media is letterboxed: width scaled to the viewport,
    /// height derived from the source aspect ratio.
    Letterbox { width: u32, height: u32 },
}

impl PresentationMode {
    /// Choose the presentation mode for `dimensions` inside `viewport`.
    pub fn select(dimensions: NaturalDimensions, viewport: Viewport) -> Self {
        if dimensions.is_vertical() || dimensions.width == 0 {
            Self::Natural
        } else {
            let height =
                (viewport.width as u64 * dimensions.height as u64 / dimensions.width as u64) as u32;
            Self::Letterbox {
                width: viewport.width,
                height,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_type_cellular() {
        assert!(NetworkType::Cellular.is_cellular());
        assert!(!NetworkType::Wifi.is_cellular());
        assert!(!NetworkType::Unknown.is_cellular());
    }

    #[test]
    fn test_vertical_media_presented_as_is() {
        let dims = NaturalDimensions::new(1080, 1920);
        let viewport = Viewport::new(390, 844);
        assert_eq!(
            PresentationMode::select(dims, viewport),
            PresentationMode::Natural
        );
    }

    #[test]
    fn test_square_media_presented_as_is() {
        let dims = NaturalDimensions::new(720, 720);
        let viewport = Viewport::new(390, 844);
        assert_eq!(
            PresentationMode::select(dims, viewport),
            PresentationMode::Natural
        );
    }

    #[test]
    fn test_horizontal_media_letterboxed() {
        let dims = NaturalDimensions::new(1920, 1080);
        let viewport = Viewport::new(390, 844);
        // Height derived from the 16:9 source aspect ratio.
        assert_eq!(
            PresentationMode::select(dims, viewport),
            PresentationMode::Letterbox {
                width: 390,
                height: 219,
            }
        );
    }
}
