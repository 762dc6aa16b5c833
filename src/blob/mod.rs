//! Blob storage for uploaded image files.
//!
//! A blob store holds the binary content of uploads, addressed by a
//! storage-relative key such as `images/3f2c...e1.jpg`. Keys are generated by
//! the store on write and handed back to the caller, who records them.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              ImageService               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            BlobStore Trait              │
//! └────────────────────┬────────────────────┘
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │ LocalBlobStore  │    │    S3BlobStore      │
//! │ (directory)     │    │ (bucket + prefix)   │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod local;
mod s3;

pub use local::LocalBlobStore;
pub use s3::{create_s3_client, S3BlobStore};

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

/// Directory that uploaded images are stored under.
pub const IMAGE_DIRECTORY: &str = "images";

/// Storage backend for binary file content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `directory` and return the generated key.
    ///
    /// `extension` is appended to the generated file name (without a dot).
    /// `content_type` is the detected MIME type of `data`.
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError>;

    /// Delete the blob at `key`.
    ///
    /// Returns `StorageError::NotFound` if nothing is stored there.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Check whether a blob exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StorageError> {
        (**self).put(directory, extension, content_type, data).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        (**self).exists(key).await
    }
}

/// Generate a fresh key of the form `{directory}/{uuid}.{extension}`.
pub fn generate_key(directory: &str, extension: &str) -> String {
    let name = uuid::Uuid::new_v4().simple().to_string();
    let directory = directory.trim_matches('/');

    match (directory.is_empty(), extension.is_empty()) {
        (true, true) => name,
        (true, false) => format!("{}.{}", name, extension),
        (false, true) => format!("{}/{}", directory, name),
        (false, false) => format!("{}/{}.{}", directory, name, extension),
    }
}

/// Reject keys that are empty, absolute, or contain `.`/`..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
