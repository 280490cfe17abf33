//! Response relay: one bounded call to the structured-extraction service

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::InvoiceAnalyzer;
use crate::types::AnalysisResult;

/// Forwards extracted text to the analyzer and returns its result unmodified
#[derive(Clone)]
pub struct ResponseRelay {
    analyzer: Arc<dyn InvoiceAnalyzer>,
    timeout: Duration,
}

impl ResponseRelay {
    pub fn new(analyzer: Arc<dyn InvoiceAnalyzer>, timeout: Duration) -> Self {
        Self { analyzer, timeout }
    }

    pub fn analyzer(&self) -> &Arc<dyn InvoiceAnalyzer> {
        &self.analyzer
    }

    /// Call the analyzer once; expiry cancels the call and reports an upstream failure
    pub async fn relay(&self, content: &str, filename: &str) -> Result<AnalysisResult> {
        let started = std::time::Instant::now();

        let result = tokio::time::timeout(self.timeout, self.analyzer.analyze(content, filename))
            .await
            .map_err(|_| Error::AnalysisTimeout {
                secs: self.timeout.as_secs(),
            })??;

        tracing::info!(
            analyzer = self.analyzer.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            score = ?result.score(),
            "Invoice analysis complete"
        );
        Ok(result)
    }
}
