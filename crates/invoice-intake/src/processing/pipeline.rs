//! Invoice pipeline: staged upload -> extraction -> analysis

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ingestion::{FormatExtractor, StagedUpload, UploadGate};
use crate::providers::InvoiceAnalyzer;
use crate::types::{AnalysisResult, ExtractionResult};

use super::relay::ResponseRelay;

/// Runs one upload through extraction and the response relay
#[derive(Clone)]
pub struct InvoicePipeline {
    gate: UploadGate,
    extractor: FormatExtractor,
    relay: ResponseRelay,
    extraction_timeout: Duration,
}

impl InvoicePipeline {
    pub fn new(config: &AppConfig, analyzer: Arc<dyn InvoiceAnalyzer>) -> Self {
        Self {
            gate: UploadGate::new(&config.upload),
            extractor: FormatExtractor::new(&config.extraction),
            relay: ResponseRelay::new(analyzer, Duration::from_secs(config.llm.timeout_secs)),
            extraction_timeout: Duration::from_secs(config.extraction.timeout_secs),
        }
    }

    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    pub fn relay(&self) -> &ResponseRelay {
        &self.relay
    }

    /// Read the staged bytes and decode them on the blocking pool
    pub async fn extract_staged(&self, staged: &StagedUpload) -> Result<ExtractionResult> {
        let upload = staged.upload().clone();
        let path = staged
            .path()
            .ok_or_else(|| Error::internal("staged upload was already removed"))?;
        let data = tokio::fs::read(path).await?;

        let extractor = self.extractor.clone();
        let filename = upload.filename.clone();
        let task = tokio::task::spawn_blocking(move || {
            extractor.extract(&upload.filename, upload.mime_type.as_deref(), &data)
        });

        match tokio::time::timeout(self.extraction_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) if join_err.is_panic() => Err(Error::file_parse(
                filename,
                "decoder panicked while reading the file",
            )),
            Ok(Err(join_err)) => Err(Error::internal(format!(
                "extraction task failed: {}",
                join_err
            ))),
            Err(_) => Err(Error::file_parse(
                filename,
                format!(
                    "extraction timed out after {}s",
                    self.extraction_timeout.as_secs()
                ),
            )),
        }
    }

    /// Extract, remove the staged file, then relay to the analyzer
    pub async fn analyze(&self, staged: StagedUpload) -> Result<AnalysisResult> {
        let filename = staged.upload().filename.clone();
        let extraction = self.extract_staged(&staged).await;
        staged.cleanup();
        let extraction = extraction?;

        tracing::info!(
            format = extraction.metadata.source_format.display_name(),
            content_chars = extraction.content.chars().count(),
            page_count = ?extraction.metadata.page_count,
            is_likely_scanned = extraction.metadata.is_likely_scanned,
            "Invoice content extracted"
        );

        self.relay.relay(&extraction.content, &filename).await
    }
}
