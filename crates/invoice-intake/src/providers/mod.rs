//! Structured-extraction backends
//!
//! The service talks to the model only through [`InvoiceAnalyzer`], so the
//! backend can be switched in configuration.

pub mod analyzer;
pub mod ollama;
pub mod openai;
mod retry;

use std::sync::Arc;

use crate::config::{AnalyzerBackend, LlmConfig};
use crate::error::Result;

pub use analyzer::InvoiceAnalyzer;
pub use ollama::OllamaAnalyzer;
pub use openai::OpenAiAnalyzer;

/// Build the analyzer selected by `config.backend`
pub fn build_analyzer(config: &LlmConfig) -> Result<Arc<dyn InvoiceAnalyzer>> {
    let analyzer: Arc<dyn InvoiceAnalyzer> = match config.backend {
        AnalyzerBackend::Ollama => Arc::new(OllamaAnalyzer::new(config)?),
        AnalyzerBackend::OpenAi => Arc::new(OpenAiAnalyzer::new(config)?),
    };
    tracing::info!(
        backend = analyzer.name(),
        model = analyzer.model(),
        base_url = %config.base_url,
        "Invoice analyzer initialized"
    );
    Ok(analyzer)
}
