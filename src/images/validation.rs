//! Validation of the image upload form.
//!
//! The form has two fields:
//!
//! - `title`: required text, 1-255 characters after trimming surrounding whitespace
//! - `image`: required file, JPEG/PNG/GIF/BMP/WebP by content, at most 2048 KB
//!
//! Every failing rule is reported, so a request missing both fields gets
//! both messages back.

use bytes::Bytes;
use image::ImageFormat;

use crate::error::ValidationErrors;

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Maximum image size in kilobytes.
pub const MAX_IMAGE_KILOBYTES: usize = 2048;

/// Maximum image size in bytes.
pub const MAX_IMAGE_BYTES: usize = MAX_IMAGE_KILOBYTES * 1024;

/// A single form field value.
#[derive(Debug, Clone)]
pub enum FormValue {
    /// Non-file part holding valid UTF-8
    Text(String),

    /// Non-file part whose bytes are not valid UTF-8
    Binary(Bytes),

    /// File part; the client's file name and content type are not kept
    File(Bytes),
}

/// Raw, unvalidated upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: Option<FormValue>,
    pub image: Option<FormValue>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(FormValue::Text(title.into()));
        self
    }

    pub fn with_image(mut self, data: impl Into<Bytes>) -> Self {
        self.image = Some(FormValue::File(data.into()));
        self
    }

    /// Set a field by its form name. Unknown names are ignored and later
    /// values replace earlier ones.
    pub fn set(&mut self, name: &str, value: FormValue) {
        match name {
            "title" => self.title = Some(value),
            "image" => self.image = Some(value),
            _ => {}
        }
    }
}

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
}

impl ImageKind {
    /// Detect the format from the file's leading bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match image::guess_format(data).ok()? {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::Bmp => Some(ImageKind::Bmp),
            ImageFormat::WebP => Some(ImageKind::WebP),
            _ => None,
        }
    }

    /// File extension used for stored blobs.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Bmp => "image/bmp",
            ImageKind::WebP => "image/webp",
        }
    }
}

/// An upload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    /// Trimmed title
    pub title: String,

    pub data: Bytes,

    pub kind: ImageKind,
}

/// Validate an upload form, collecting every failing rule.
pub fn validate_upload(form: UploadForm) -> Result<ValidatedUpload, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title = validate_title(form.title, &mut errors);
    let image = validate_image(form.image, &mut errors);

    match (title, image) {
        (Some(title), Some((data, kind))) if errors.is_empty() => {
            Ok(ValidatedUpload { title, data, kind })
        }
        _ => Err(errors),
    }
}

fn validate_title(value: Option<FormValue>, errors: &mut ValidationErrors) -> Option<String> {
    let text = match value {
        None => {
            errors.add("title", "The title field is required.");
            return None;
        }
        Some(FormValue::File(_)) | Some(FormValue::Binary(_)) => {
            errors.add("title", "The title field must be a string.");
            return None;
        }
        Some(FormValue::Text(text)) => text,
    };

    let title = text.trim();
    if title.is_empty() {
        errors.add("title", "The title field is required.");
        return None;
    }

    if title.chars().count() > MAX_TITLE_CHARS {
        errors.add(
            "title",
            format!(
                "The title field must not be greater than {} characters.",
                MAX_TITLE_CHARS
            ),
        );
        return None;
    }

    Some(title.to_string())
}

fn validate_image(
    value: Option<FormValue>,
    errors: &mut ValidationErrors,
) -> Option<(Bytes, ImageKind)> {
    let data = match value {
        None => {
            errors.add("image", "The image field is required.");
            return None;
        }
        Some(FormValue::Text(_)) | Some(FormValue::Binary(_)) => {
            errors.add("image", "The image field must be an image.");
            return None;
        }
        Some(FormValue::File(data)) => data,
    };

    let kind = ImageKind::detect(&data);
    if kind.is_none() {
        errors.add("image", "The image field must be an image.");
    }

    if data.len() > MAX_IMAGE_BYTES {
        errors.add(
            "image",
            format!(
                "The image field must not be greater than {} kilobytes.",
                MAX_IMAGE_KILOBYTES
            ),
        );
        return None;
    }

    kind.map(|kind| (data, kind))
}
