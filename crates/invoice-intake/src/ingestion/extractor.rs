//! Multi-format invoice extractor

use calamine::{Data, DataType, Reader};

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::types::{ExtractionMetadata, ExtractionResult, SourceFormat};

/// Turns uploaded bytes into a single normalized text blob
#[derive(Debug, Clone)]
pub struct FormatExtractor {
    min_pdf_text_chars: usize,
}

impl Default for FormatExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl FormatExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            min_pdf_text_chars: config.min_pdf_text_chars,
        }
    }

    /// Extract text from `data`, choosing the decoder from the filename and MIME type.
    ///
    /// This is CPU-bound and blocking; async callers should run it on the
    /// blocking pool.
    pub fn extract(
        &self,
        filename: &str,
        mime_type: Option<&str>,
        data: &[u8],
    ) -> Result<ExtractionResult> {
        let format = SourceFormat::detect(filename, mime_type);
        tracing::debug!(
            filename,
            format = format.display_name(),
            bytes = data.len(),
            "Extracting invoice content"
        );

        let result = match format {
            SourceFormat::Csv => Self::extract_plain(SourceFormat::Csv, data),
            SourceFormat::Spreadsheet => Self::extract_spreadsheet(filename, data)?,
            SourceFormat::Pdf => self.extract_pdf(filename, data)?,
            SourceFormat::Text => Self::extract_plain(SourceFormat::Text, data),
        };

        if !result.metadata.is_likely_scanned && result.content.is_empty() {
            return Err(Error::file_parse(filename, "no text content could be extracted"));
        }

        Ok(result)
    }

    /// CSV and plain text: bytes as UTF-8, invalid sequences replaced
    fn extract_plain(format: SourceFormat, data: &[u8]) -> ExtractionResult {
        ExtractionResult {
            content: String::from_utf8_lossy(data).into_owned(),
            metadata: ExtractionMetadata {
                source_format: format,
                byte_size: data.len() as u64,
                page_count: None,
                is_likely_scanned: false,
            },
        }
    }

    /// Render every sheet as CSV under a `=== Sheet: <name> ===` header
    fn extract_spreadsheet(filename: &str, data: &[u8]) -> Result<ExtractionResult> {
        let cursor = std::io::Cursor::new(data);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut sections = Vec::with_capacity(sheet_names.len());

        for sheet_name in &sheet_names {
            let range = workbook.worksheet_range(sheet_name).map_err(|e| {
                Error::file_parse(filename, format!("sheet '{}': {}", sheet_name, e))
            })?;

            let mut lines = Vec::with_capacity(range.height());
            for row in range.rows() {
                lines.push(csv_line(row).map_err(|e| {
                    Error::file_parse(filename, format!("sheet '{}': {}", sheet_name, e))
                })?);
            }

            sections.push(format!("=== Sheet: {} ===\n{}", sheet_name, lines.join("\n")));
        }

        Ok(ExtractionResult {
            content: sections.join("\n\n"),
            metadata: ExtractionMetadata {
                source_format: SourceFormat::Spreadsheet,
                byte_size: data.len() as u64,
                page_count: Some(sheet_names.len() as u32),
                is_likely_scanned: false,
            },
        })
    }

    /// Text-layer extraction with a scanned-document placeholder
    fn extract_pdf(&self, filename: &str, data: &[u8]) -> Result<ExtractionResult> {
        let document = lopdf::Document::load_mem(data);
        let page_count = document
            .as_ref()
            .ok()
            .map(|doc| doc.get_pages().len() as u32);

        let text = match extract_pdf_text(data) {
            Ok(text) => text,
            Err(primary) => {
                let doc = document.as_ref().map_err(|e| {
                    Error::file_parse(filename, format!("{}; failed to load PDF: {}", primary, e))
                })?;
                tracing::warn!(filename, error = %primary, "pdf-extract failed, trying per-page fallback");
                extract_pdf_text_fallback(doc)
                    .map_err(|e| Error::file_parse(filename, format!("{}; {}", primary, e)))?
            }
        };

        let trimmed_chars = text.trim().chars().count();
        let metadata = |is_likely_scanned| ExtractionMetadata {
            source_format: SourceFormat::Pdf,
            byte_size: data.len() as u64,
            page_count,
            is_likely_scanned,
        };

        if trimmed_chars >= self.min_pdf_text_chars {
            return Ok(ExtractionResult {
                content: text,
                metadata: metadata(false),
            });
        }

        tracing::info!(
            filename,
            trimmed_chars,
            "PDF has little or no text layer, using scanned placeholder"
        );
        Ok(ExtractionResult {
            content: scanned_placeholder(filename, data.len() as u64, page_count),
            metadata: metadata(true),
        })
    }
}

/// Primary extractor; decoder panics are turned into errors
fn extract_pdf_text(data: &[u8]) -> std::result::Result<String, String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(format!("pdf-extract error: {}", e)),
        Err(_) => Err("pdf-extract panicked".to_string()),
    }
}

/// Secondary extractor working page by page on the parsed document
fn extract_pdf_text_fallback(doc: &lopdf::Document) -> std::result::Result<String, String> {
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    doc.extract_text(&pages)
        .map_err(|e| format!("fallback extraction failed: {}", e))
}

fn scanned_placeholder(filename: &str, byte_size: u64, page_count: Option<u32>) -> String {
    let pages = page_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "[PDF file: {}]\nExtracted text was minimal or empty. This may be a scanned/image-based PDF.\nFile size: {} bytes\nPages: {}",
        filename, byte_size, pages
    )
}

/// One CSV record without its terminator
fn csv_line(row: &[Data]) -> std::result::Result<String, String> {
    let fields: Vec<String> = row.iter().map(cell_text).collect();

    // csv writes a lone empty field as `""`; a blank row stays blank
    if fields.iter().all(String::is_empty) {
        return Ok(",".repeat(fields.len().saturating_sub(1)));
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&fields).map_err(|e| e.to_string())?;
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;

    let mut line = String::from_utf8_lossy(&bytes).into_owned();
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}
