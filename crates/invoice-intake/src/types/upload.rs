//! Uploaded file descriptor

use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the client declared about an upload, plus the size actually received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Declared filename
    pub filename: String,
    /// Declared MIME type, if the client sent one
    pub mime_type: Option<String>,
    /// Size in bytes
    pub size_bytes: u64,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, mime_type: Option<String>, size_bytes: u64) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            size_bytes,
        }
    }
}

/// Lower-cased extension of `filename` with a leading dot
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}
