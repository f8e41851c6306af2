//! Upload metadata encoding for the resumable protocol.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reelvault_common::FileId;

/// Descriptive metadata attached to an upload at create time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub filename: String,
    pub filetype: String,
    pub vault_id: String,
}

impl UploadMetadata {
    pub fn new<F: Into<String>, T: Into<String>, V: Into<String>>(
        filename: F,
        filetype: T,
        vault_id: V,
    ) -> Self {
        Self {
            filename: filename.into(),
            filetype: filetype.into(),
            vault_id: vault_id.into(),
        }
    }

    /// Encode as an `Upload-Metadata` header value: comma-separated
    /// `key base64(value)` pairs.
    pub fn to_header_value(&self) -> String {
        [
            ("filename", &self.filename),
            ("filetype", &self.filetype),
            ("vaultId", &self.vault_id),
        ]
        .iter()
        .map(|(key, value)| format!("{} {}", key, STANDARD.encode(value)))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Extract the canonical file id from an upload resource URL.
///
/// The id is the URL's trailing path segment.
pub fn file_id_from_resource_url(url: &str) -> Option<FileId> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(FileId::from)
}
