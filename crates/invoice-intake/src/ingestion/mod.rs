//! Upload validation, staging and multi-format text extraction

mod extractor;
mod gate;
mod staging;

pub use extractor::FormatExtractor;
pub use gate::UploadGate;
pub use staging::{StagedUpload, StagingWriter};
