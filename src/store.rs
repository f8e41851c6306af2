//! Local registry of published file identifiers.
//!
//! Backed by a single JSON file holding an array of id strings. A missing
//! file reads as an empty registry; recording an id the registry already
//! holds is a no-op.

use reelvault_common::{FileId, StoreError};
use std::path::{Path, PathBuf};

pub struct FileIdStore {
    path: PathBuf,
}

impl FileIdStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all recorded file ids.
    pub async fn load(&self) -> Result<Vec<FileId>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<String>>(&bytes)
                .map(|ids| ids.into_iter().map(FileId::from).collect())
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Record `file_id`. Returns true if it was newly added.
    pub async fn record(&self, file_id: &FileId) -> Result<bool, StoreError> {
        let mut ids = self.load().await?;
        if ids.iter().any(|id| id == file_id) {
            return Ok(false);
        }
        ids.push(file_id.clone());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        let json =
            serde_json::to_vec_pretty(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;

        tracing::debug!(file_id = %file_id, path = %self.path.display(), "File id recorded");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileIdStore {
        FileIdStore::new(dir.path().join("file_id.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.record(&FileId::new("a")).await.unwrap());
        assert!(store.record(&FileId::new("b")).await.unwrap());

        let ids = store.load().await.unwrap();
        assert_eq!(ids, vec![FileId::new("a"), FileId::new("b")]);
    }

    #[tokio::test]
    async fn test_record_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.record(&FileId::new("a")).await.unwrap());
        assert!(!store.record(&FileId::new("a")).await.unwrap());
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        tokio::fs::write(store.path(), b"{not json]").await.unwrap();

        assert!(matches!(
            store.load().await.unwrap_err(),
            StoreError::Corrupt(_)
        ));
    }
}
