//! # Image Vault
//!
//! An authenticated REST API for uploading, listing, searching, fetching and
//! deleting image records.
//!
//! Each record pairs a title with a stored image file. Files live in a blob
//! store (a local directory or an S3 bucket); record metadata lives in a
//! record store (SQLite or memory). Every `/products` route sits behind a
//! shared-secret header check.
//!
//! ## Features
//!
//! - **Upload validation**: titles up to 255 characters, images detected by
//!   magic bytes and capped at 2048 KB, with Laravel-style error bodies
//! - **Search**: case-sensitive title substring filter, newest first
//! - **Consistent deletes**: the file is removed before the record, and a
//!   failed file delete keeps the record
//! - **Pluggable storage**: local filesystem or S3-compatible object storage
//!
//! ## Architecture
//!
//! - [`blob`] - Blob store trait with local and S3 backends
//! - [`record`] - Record store trait with SQLite and in-memory backends
//! - [`images`] - Upload validation and the image service
//! - [`server`] - Axum-based HTTP server, auth gate and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_vault::{create_router, ApiKeyAuth, ImageService, LocalBlobStore, MemoryRecordStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ImageService::new(
//!         LocalBlobStore::new("storage/public"),
//!         MemoryRecordStore::new(),
//!     );
//!     let router = create_router(
//!         service,
//!         RouterConfig::new(ApiKeyAuth::with_default_header("my-secret")),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod blob;
pub mod config;
pub mod error;
pub mod images;
pub mod record;
pub mod server;

// Re-export commonly used types
pub use blob::{create_s3_client, BlobStore, LocalBlobStore, S3BlobStore, IMAGE_DIRECTORY};
pub use config::{Config, StorageBackend};
pub use error::{ApiError, RecordError, StorageError, ValidationErrors};
pub use images::{
    validate_upload, ImageKind, ImageService, UploadForm, ValidatedUpload, MAX_IMAGE_BYTES,
    MAX_TITLE_CHARS,
};
pub use record::{ImageRecord, MemoryRecordStore, NewImageRecord, RecordStore, SqliteRecordStore};
pub use server::{create_router, ApiKeyAuth, AppState, AuthError, ErrorResponse, RouterConfig};
