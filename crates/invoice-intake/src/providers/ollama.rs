//! Ollama analyzer using `/api/generate` in JSON mode

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::{parse_analysis, PromptBuilder};
use crate::types::AnalysisResult;

use super::analyzer::InvoiceAnalyzer;
use super::retry::retry_request;

/// Ollama API client for invoice analysis
pub struct OllamaAnalyzer {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_retries: u32,
    max_input_chars: usize,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaAnalyzer {
    /// Create a new Ollama analyzer
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            max_input_chars: config.max_input_chars,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::analysis(format!(
                "Ollama generation failed: HTTP {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}

#[async_trait]
impl InvoiceAnalyzer for OllamaAnalyzer {
    async fn analyze(&self, content: &str, filename: &str) -> Result<AnalysisResult> {
        let prompt = PromptBuilder::build_completion_prompt(content, filename, self.max_input_chars);

        tracing::info!(model = %self.model, filename, "Analyzing invoice with Ollama");

        let raw = retry_request(self.max_retries, || self.generate(&prompt)).await?;
        parse_analysis(&raw)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
