//! invoice-intake: cloud invoice ingestion with structured cost summaries
//!
//! Accepts an uploaded billing invoice (PDF, CSV, XLSX/XLS), validates it at
//! the upload gate, extracts its text into one normalized blob, and relays
//! that text to a language model that returns a JSON cost summary.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::{Error, ErrorKind, Result};
pub use ingestion::{FormatExtractor, StagedUpload, UploadGate};
pub use processing::{InvoicePipeline, ResponseRelay};
pub use providers::InvoiceAnalyzer;
pub use server::InvoiceServer;
pub use types::{AnalysisResult, ExtractionMetadata, ExtractionResult, SourceFormat, UploadedFile};
