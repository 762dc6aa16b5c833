//! Image service: orchestrates the blob store and the record store.
//!
//! Every write touches two stores that share no transaction, so each
//! operation orders its steps to avoid leaving a record that points at a
//! missing blob:
//!
//! - create: write blob, then insert record; a failed insert removes the blob
//! - destroy: delete blob, then delete record; a failed blob delete keeps the record

use tracing::{debug, error, info, warn};

use crate::blob::{BlobStore, IMAGE_DIRECTORY};
use crate::error::{ApiError, RecordError, StorageError};
use crate::record::{ImageRecord, NewImageRecord, RecordStore};

use super::validation::ValidatedUpload;

/// Service implementing list, create, show and destroy for image records.
pub struct ImageService<B: BlobStore, R: RecordStore> {
    blobs: B,
    records: R,
}

impl<B: BlobStore, R: RecordStore> ImageService<B, R> {
    pub fn new(blobs: B, records: R) -> Self {
        Self { blobs, records }
    }

    /// Get a reference to the blob store.
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Get a reference to the record store.
    pub fn records(&self) -> &R {
        &self.records
    }

    /// List records newest first, optionally filtered by title substring.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<ImageRecord>, ApiError> {
        let records = self.records.latest(search).await?;
        debug!(search = ?search, count = records.len(), "Listed images");
        Ok(records)
    }

    /// Resolve an identifier to a record, or `ApiError::NotFound`.
    pub async fn find_by_id(&self, id: i64) -> Result<ImageRecord, ApiError> {
        self.records
            .find(id)
            .await?
            .ok_or_else(|| ApiError::NotFound { id: id.to_string() })
    }

    /// Store the blob, then insert its record.
    pub async fn create(&self, upload: ValidatedUpload) -> Result<ImageRecord, ApiError> {
        let ValidatedUpload { title, data, kind } = upload;
        let size = data.len();

        let path = self
            .blobs
            .put(IMAGE_DIRECTORY, kind.extension(), kind.mime_type(), data)
            .await?;

        match self
            .records
            .insert(NewImageRecord::new(title, path.clone()))
            .await
        {
            Ok(record) => {
                info!(
                    id = record.id,
                    file_path = %record.file_path,
                    bytes = size,
                    "Created image"
                );
                Ok(record)
            }
            Err(insert_err) => {
                if let Err(cleanup_err) = self.blobs.delete(&path).await {
                    error!(
                        file_path = %path,
                        error = %cleanup_err,
                        "Failed to remove blob after record insert failed; blob is orphaned"
                    );
                }
                Err(insert_err.into())
            }
        }
    }

    /// Delete the record's blob, then the record itself.
    pub async fn destroy(&self, id: i64) -> Result<ImageRecord, ApiError> {
        let record = self.find_by_id(id).await?;

        match self.blobs.delete(&record.file_path).await {
            Ok(()) => {}
            Err(StorageError::NotFound(path)) => {
                warn!(id, file_path = %path, "Blob already missing; deleting record anyway");
            }
            Err(e) => return Err(e.into()),
        }

        match self.records.delete(id).await {
            Ok(()) => {}
            Err(RecordError::NotFound(_)) => {
                return Err(ApiError::NotFound { id: id.to_string() })
            }
            Err(e) => return Err(e.into()),
        }

        info!(id, file_path = %record.file_path, "Deleted image");
        Ok(record)
    }
}
