//! Filesystem-backed blob store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{generate_key, validate_key, BlobStore};
use crate::error::StorageError;

/// Blob store rooted at a local directory.
///
/// The key `images/abc.jpg` is stored at `{root}/images/abc.jpg`. Parent
/// directories are created on demand.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a key, after validating it.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        let key = generate_key(directory, extension);
        let path = self.path_for(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Io(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::Io(format!("failed to write {}: {}", path.display(), e)))?;

        debug!(key = %key, content_type, bytes = data.len(), "Stored blob");
        Ok(key)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::Io(format!(
                "failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::Io(format!("failed to stat {}: {}", path.display(), e)))
    }
}
