//! Structured-extraction service trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::AnalysisResult;

/// Turns normalized invoice text into a structured cost summary
///
/// Implementations:
/// - `OllamaAnalyzer`: local Ollama server (`/api/generate`)
/// - `OpenAiAnalyzer`: OpenAI-compatible chat completions
#[async_trait]
pub trait InvoiceAnalyzer: Send + Sync {
    /// Analyze one invoice
    async fn analyze(&self, content: &str, filename: &str) -> Result<AnalysisResult>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
