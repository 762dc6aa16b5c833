//! HTTP request handlers for the image API.
//!
//! # Endpoints
//!
//! - `GET /products` - List images, optionally filtered by `search`
//! - `POST /products` - Upload an image (multipart: `title`, `image`)
//! - `GET /products/{id}` - Fetch one image record
//! - `DELETE /products/{id}` - Delete an image record and its file
//! - `GET /health` - Health check endpoint

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::blob::BlobStore;
use crate::error::{ApiError, RecordError};
use crate::images::{validate_upload, FormValue, ImageService, UploadForm};
use crate::record::{ImageRecord, RecordStore};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the image service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<B: BlobStore, R: RecordStore> {
    /// The service behind every image route
    pub service: Arc<ImageService<B, R>>,
}

impl<B: BlobStore, R: RecordStore> AppState<B, R> {
    /// Create a new application state with the given image service.
    pub fn new(service: ImageService<B, R>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl<B: BlobStore, R: RecordStore> Clone for AppState<B, R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQueryParams {
    /// Case-sensitive title substring; present but empty matches everything
    #[serde(default)]
    pub search: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Field-level validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    /// Create an error response carrying field-level messages.
    pub fn with_errors(
        message: impl Into<String>,
        errors: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            message: message.into(),
            errors: Some(errors),
        }
    }
}

/// Plain `{"message": ...}` success body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to HTTP response.
///
/// Errors are logged by severity:
/// - 5xx at ERROR
/// - 404 at DEBUG
/// - other 4xx at WARN
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Record(RecordError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Record(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::Validation(errors) => {
                ErrorResponse::with_errors(errors.summary(), errors.fields().clone())
            }
            ApiError::Record(RecordError::NotFound(id)) => {
                ErrorResponse::new(format!("No image found with id {}.", id))
            }
            // Keep backend details in the logs
            ApiError::Storage(_) => ErrorResponse::new("Failed to access image storage."),
            ApiError::Record(_) => ErrorResponse::new("Failed to access image records."),
            _ => ErrorResponse::new(self.to_string()),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), "Server error: {}", self);
        } else if status == StatusCode::NOT_FOUND {
            debug!(status = status.as_u16(), "Resource not found: {}", self);
        } else {
            warn!(status = status.as_u16(), "Client error: {}", self);
        }

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidMultipart(err.body_text())
        }
    }
}

/// Parse a path identifier. Anything that is not an integer cannot name a
/// record, so it resolves to not-found.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::NotFound { id: raw.to_string() })
}

/// Read the upload form from a multipart body.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        let is_file = field.file_name().is_some();
        let data = field.bytes().await?;

        // Non-UTF-8 text parts are kept as bytes so validation can reject them
        let value = if is_file {
            FormValue::File(data)
        } else {
            match std::str::from_utf8(&data) {
                Ok(text) => FormValue::Text(text.to_owned()),
                Err(_) => FormValue::Binary(data),
            }
        };

        form.set(&name, value);
    }

    Ok(form)
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle list requests.
///
/// # Endpoint
///
/// `GET /products?search={substring}`
///
/// # Response
///
/// `200 OK` with a JSON array of records, newest first. No matches yields `[]`.
pub async fn index_handler<B: BlobStore, R: RecordStore>(
    State(state): State<AppState<B, R>>,
    Query(query): Query<IndexQueryParams>,
) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    let records = state.service.list(query.search.as_deref()).await?;
    Ok(Json(records))
}

/// Handle upload requests.
///
/// # Endpoint
///
/// `POST /products` with `multipart/form-data` fields `title` and `image`.
///
/// # Response
///
/// - `201 Created`: the new record
/// - `400 Bad Request`: unreadable multipart body
/// - `422 Unprocessable Entity`: validation failed, with an `errors` map
/// - `500 Internal Server Error`: storage failure
///
/// A body that is not multipart at all is validated as an empty form.
pub async fn store_handler<B: BlobStore, R: RecordStore>(
    State(state): State<AppState<B, R>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ImageRecord>), ApiError> {
    let form = match multipart {
        Ok(multipart) => read_upload_form(multipart).await?,
        Err(rejection) => {
            debug!("Create request is not multipart: {}", rejection.body_text());
            UploadForm::new()
        }
    };

    let upload = validate_upload(form)?;
    let record = state.service.create(upload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Handle single-record requests.
///
/// # Endpoint
///
/// `GET /products/{id}`
///
/// # Response
///
/// - `200 OK`: the record
/// - `404 Not Found`: no record with that id
pub async fn show_handler<B: BlobStore, R: RecordStore>(
    State(state): State<AppState<B, R>>,
    Path(id): Path<String>,
) -> Result<Json<ImageRecord>, ApiError> {
    let id = parse_id(&id)?;
    let record = state.service.find_by_id(id).await?;
    Ok(Json(record))
}

/// Handle delete requests.
///
/// # Endpoint
///
/// `DELETE /products/{id}`
///
/// # Response
///
/// - `200 OK`: `{"message": "Image deleted successfully."}`
/// - `404 Not Found`: no record with that id
/// - `500 Internal Server Error`: the file could not be deleted; the record is kept
pub async fn destroy_handler<B: BlobStore, R: RecordStore>(
    State(state): State<AppState<B, R>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    state.service.destroy(id).await?;

    Ok(Json(MessageResponse {
        message: "Image deleted successfully.".to_string(),
    }))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
