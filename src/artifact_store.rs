use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

/// Key→blob persistence capability for trained model artifacts.
///
/// The store is deliberately minimal: artifacts are opaque blobs saved and
/// loaded as one unit. A missing key is `Ok(None)`, not an error, so callers
/// can distinguish "never trained" from a real storage failure.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists `blob` under `key`, replacing any previous value.
    async fn save(&self, key: &str, blob: &[u8]) -> Result<(), AppError>;

    /// Loads the blob stored under `key`, or `None` if absent.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
}

/// Filesystem-backed artifact store.
///
/// Each key maps to `<root>/<key>.json`; the directory is created on first
/// save.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save(&self, key: &str, blob: &[u8]) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::ArtifactStore(format!(
                "Failed to create artifact dir {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let path = self.blob_path(key);
        tokio::fs::write(&path, blob).await.map_err(|e| {
            AppError::ArtifactStore(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!("Artifact '{}' saved to {}", key, path.display());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.blob_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::ArtifactStore(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        assert!(store.load("never_saved").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("nested"));
        store.save("model", b"payload").await.unwrap();
        let loaded = store.load("model").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"payload".as_ref()));
    }
}
