//! Image attachments
//!
//! Images travel as base64 `inlineData` parts. The browser shows them back
//! as `data:` URIs.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::errors::{Result, TaxbriefError};
use crate::llm::Part;

/// Largest accepted image, in bytes (5 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Used when the file type cannot be determined.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    mime_type: String,
    bytes: Vec<u8>,
}

impl Attachment {
    pub fn from_bytes(bytes: Vec<u8>, mime_type: Option<&str>) -> Result<Self> {
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(TaxbriefError::attachment_too_large(format!(
                "Image size must be less than 5MB (got {} bytes)",
                bytes.len()
            )));
        }

        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        Ok(Self { mime_type, bytes })
    }

    /// Read an image file; the MIME type is guessed from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            TaxbriefError::file_operation(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes, mime_type_for_path(path))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:{mime};base64,{payload}`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn to_part(&self) -> Part {
        Part::inline_data(self.mime_type.clone(), self.to_base64())
    }
}

/// Payload after the first comma of a data URI. Input without a comma is
/// returned unchanged.
pub fn strip_data_uri(uri: &str) -> &str {
    uri.split_once(',').map_or(uri, |(_, payload)| payload)
}

fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
