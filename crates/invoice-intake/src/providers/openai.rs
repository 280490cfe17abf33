//! OpenAI-compatible chat completions analyzer

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

/// Analyzer backed by a `/chat/completions` endpoint in JSON-object mode
pub struct OpenAiAnalyzer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_retries: u32,
    max_input_chars: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiAnalyzer {
    /// Create an analyzer, reading the API key from the configured env var
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "No API key found, sending unauthenticated requests"
            );
        }
        Self::with_api_key(config, api_key)
    }

    /// Create an analyzer with an explicit API key
    pub fn with_api_key(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            max_input_chars: config.max_input_chars,
        })
    }

    async fn complete(&self, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: PromptBuilder::system_instructions(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::analysis(format!(
                "Chat completion failed: HTTP {}: {}",
                status, body
            )));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::analysis("Chat completion returned no content"))
    }
}

#[async_trait]
impl InvoiceAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, content: &str, filename: &str) -> Result<AnalysisResult> {
        let prompt = PromptBuilder::build_invoice_prompt(content, filename, self.max_input_chars);

        tracing::info!(model = %self.model, filename, "Analyzing invoice with chat completions");

        let raw = retry_request(self.max_retries, || self.complete(&prompt)).await?;
        parse_analysis(&raw)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
