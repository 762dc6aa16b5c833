//! Image resource: upload validation and the service behind the HTTP handlers.

mod service;
pub mod validation;

pub use service::ImageService;
pub use validation::{
    validate_upload, FormValue, ImageKind, UploadForm, ValidatedUpload,
    MAX_IMAGE_BYTES, MAX_IMAGE_KILOBYTES, MAX_TITLE_CHARS,
};
