//! Core types for the intake pipeline

pub mod analysis;
pub mod extraction;
pub mod upload;

pub use analysis::AnalysisResult;
pub use extraction::{ExtractionMetadata, ExtractionResult, SourceFormat};
pub use upload::UploadedFile;
