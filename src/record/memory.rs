//! In-process record store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{newest_first, ImageRecord, NewImageRecord, RecordStore};
use crate::error::RecordError;

/// Record store held entirely in memory.
///
/// Identifiers start at 1 and are never reused, even after deletes.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    records: BTreeMap<i64, ImageRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: NewImageRecord) -> Result<ImageRecord, RecordError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;

        let now = Utc::now();
        let stored = ImageRecord {
            id: inner.next_id,
            title: record.title,
            file_path: record.file_path,
            created_at: now,
            updated_at: now,
        };
        inner.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find(&self, id: i64) -> Result<Option<ImageRecord>, RecordError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RecordError> {
        match self.inner.write().await.records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RecordError::NotFound(id)),
        }
    }

    async fn latest(&self, title_filter: Option<&str>) -> Result<Vec<ImageRecord>, RecordError> {
        let inner = self.inner.read().await;
        let mut records: Vec<ImageRecord> = inner
            .records
            .values()
            .filter(|r| title_filter.map_or(true, |needle| r.title.contains(needle)))
            .cloned()
            .collect();
        records.sort_by(newest_first);
        Ok(records)
    }

    async fn count(&self) -> Result<usize, RecordError> {
        Ok(self.inner.read().await.records.len())
    }
}
