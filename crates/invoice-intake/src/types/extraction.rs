//! Extraction output and source format detection

use serde::{Deserialize, Serialize};

use super::upload::extension_of;

/// Decoder selected for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-separated text, passed through
    Csv,
    /// Excel/OpenDocument workbook
    Spreadsheet,
    /// PDF with a text layer (or a scanned placeholder)
    Pdf,
    /// Anything else, read as UTF-8 text
    Text,
}

impl SourceFormat {
    /// Detect the format from the filename, falling back to the declared MIME type
    pub fn detect(filename: &str, mime_type: Option<&str>) -> Self {
        if let Some(format) = extension_of(filename).as_deref().and_then(Self::from_extension) {
            return format;
        }
        mime_type.and_then(Self::from_mime).unwrap_or(SourceFormat::Text)
    }

    /// Map a dotted, lower-case extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".csv" => Some(SourceFormat::Csv),
            ".xlsx" | ".xls" | ".xlsm" | ".xlsb" | ".ods" => Some(SourceFormat::Spreadsheet),
            ".pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }

    /// Map a declared MIME type, ignoring parameters such as `charset`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "text/csv" => Some(SourceFormat::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.oasis.opendocument.spreadsheet" => Some(SourceFormat::Spreadsheet),
            "application/pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Spreadsheet => "Spreadsheet",
            SourceFormat::Pdf => "PDF",
            SourceFormat::Text => "Text",
        }
    }
}

/// Metadata recorded alongside extracted content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    /// Decoder that produced the content
    pub source_format: SourceFormat,
    /// Size of the uploaded file in bytes
    pub byte_size: u64,
    /// PDF pages, or sheets for a workbook
    pub page_count: Option<u32>,
    /// Set when a PDF had (almost) no text layer and `content` is a placeholder
    pub is_likely_scanned: bool,
}

/// Normalized text handed to the structured-extraction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text, or a placeholder for scanned PDFs
    pub content: String,
    /// Extraction metadata
    pub metadata: ExtractionMetadata,
}
