//! Image record persistence.
//!
//! Records hold the metadata of an upload (title and blob key), never the
//! binary itself. Stores assign identifiers and timestamps on insert and
//! return newest-first listings.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A stored image record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Store-assigned identifier
    pub id: i64,

    /// Human-readable title (1-255 characters)
    pub title: String,

    /// Storage-relative key of the blob
    pub file_path: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImageRecord {
    pub title: String,
    pub file_path: String,
}

impl NewImageRecord {
    pub fn new(title: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file_path: file_path.into(),
        }
    }
}

/// Persistent store for image records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record, assigning its id and timestamps.
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RecordError>;

    /// Look up a record by id.
    async fn find(&self, id: i64) -> Result<Option<ImageRecord>, RecordError>;

    /// Delete a record by id.
    ///
    /// Returns `RecordError::NotFound` if no such record exists.
    async fn delete(&self, id: i64) -> Result<(), RecordError>;

    /// All records, newest first, optionally keeping only titles that
    /// contain `title_filter` (case-sensitive).
    async fn latest(&self, title_filter: Option<&str>) -> Result<Vec<ImageRecord>, RecordError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, RecordError>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RecordError> {
        (**self).insert(record).await
    }

    async fn find(&self, id: i64) -> Result<Option<ImageRecord>, RecordError> {
        (**self).find(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), RecordError> {
        (**self).delete(id).await
    }

    async fn latest(&self, title_filter: Option<&str>) -> Result<Vec<ImageRecord>, RecordError> {
        (**self).latest(title_filter).await
    }

    async fn count(&self) -> Result<usize, RecordError> {
        (**self).count().await
    }
}

/// Newest-first ordering shared by all stores: `created_at` descending,
/// ties broken by `id` descending.
pub(crate) fn newest_first(a: &ImageRecord, b: &ImageRecord) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}
