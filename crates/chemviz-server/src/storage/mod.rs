//! Media storage for uploaded CSV files
//!
//! Files live under `<media root>/datasets/` keyed by their base name. A
//! second upload with the same name replaces the earlier file.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::MediaConfig;

/// Subdirectory of the media root holding dataset files.
pub const DATASETS_DIR: &str = "datasets";

#[derive(Clone, Debug)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Create the datasets directory if needed
    pub async fn new(config: &MediaConfig) -> Result<Self> {
        let dir = config.root.join(DATASETS_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create media directory {}", dir.display()))?;

        tracing::info!(dir = %dir.display(), "Media storage initialized");
        Ok(Self { dir })
    }

    /// Storage key for a client-supplied file name: its last path component.
    ///
    /// Returns `None` when nothing usable is left.
    pub fn build_key(&self, file_name: &str) -> Option<String> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if base.is_empty() || base == "." || base == ".." {
            return None;
        }
        Some(base.to_string())
    }

    pub async fn upload(&self, key: &str, content: &[u8]) -> Result<()> {
        let path = self.dir.join(key);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(key, size = content.len(), "Stored upload");
        Ok(())
    }

    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(key);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, Storage) {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(&MediaConfig {
            root: tmp.path().to_path_buf(),
        })
        .await
        .unwrap();
        (tmp, storage)
    }

    #[tokio::test]
    async fn test_build_key_strips_directories() {
        let (_tmp, storage) = storage().await;
        assert_eq!(storage.build_key("pumps.csv").as_deref(), Some("pumps.csv"));
        assert_eq!(storage.build_key("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(storage.build_key("C:\\data\\valves.csv").as_deref(), Some("valves.csv"));
        assert_eq!(storage.build_key("uploads/"), None);
        assert_eq!(storage.build_key(".."), None);
        assert_eq!(storage.build_key(""), None);
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let (tmp, storage) = storage().await;
        storage.upload("a.csv", b"Type\nA\n").await.unwrap();
        assert_eq!(storage.download("a.csv").await.unwrap(), b"Type\nA\n");
        assert!(tmp.path().join(DATASETS_DIR).join("a.csv").is_file());
    }

    #[tokio::test]
    async fn test_upload_replaces_existing_file() {
        let (_tmp, storage) = storage().await;
        storage.upload("a.csv", b"old").await.unwrap();
        storage.upload("a.csv", b"new").await.unwrap();
        assert_eq!(storage.download("a.csv").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_download_missing_file_fails() {
        let (_tmp, storage) = storage().await;
        assert!(storage.download("missing.csv").await.is_err());
    }
}
