use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Errors raised by a blob store backend
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No blob exists at the given path
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Key is empty, absolute, or escapes the storage root
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),
}

/// Errors raised by a record store backend
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    /// No record with this identifier
    #[error("Record not found: {0}")]
    NotFound(i64),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),
}

/// Field-level validation failures, keyed by form field name.
///
/// Fields keep the order in which they were first reported so the summary
/// message names the first failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    order: Vec<String>,
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains_key(&field) {
            self.order.push(field.clone());
        }
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// Messages reported for a single field.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Summary line: the first message, plus a count of the remaining ones.
    pub fn summary(&self) -> String {
        let first = self
            .order
            .first()
            .and_then(|f| self.fields.get(f))
            .and_then(|msgs| msgs.first())
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());

        match self.len().saturating_sub(1) {
            0 => first,
            1 => format!("{} (and 1 more error)", first),
            n => format!("{} (and {} more errors)", first, n),
        }
    }

    /// Convert into `Err` if any messages were recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors surfaced at the HTTP boundary.
///
/// The status code mapping lives in `server::handlers`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Create form failed validation
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Multipart body could not be read
    #[error("Malformed multipart body: {0}")]
    InvalidMultipart(String),

    /// Request body exceeded the configured limit
    #[error("The request body is too large.")]
    PayloadTooLarge,

    /// Identifier does not resolve to a record
    #[error("No image found with id {id}.")]
    NotFound { id: String },

    /// Blob store failure after validation passed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Record store failure
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}
