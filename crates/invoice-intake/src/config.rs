//! Configuration for the invoice intake service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Upload gate configuration
    pub upload: UploadConfig,
    /// Format extraction configuration
    pub extraction: ExtractionConfig,
    /// Structured-extraction (LLM) configuration
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load from `path` if given and present, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                tracing::warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Request body limit for the upload route in bytes (default: 32MB).
    /// Kept above `upload.max_file_size` so the gate reports the size error.
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            max_request_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Upload gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (default: 20MB)
    pub max_file_size: u64,
    /// Accepted extensions, with leading dot
    pub allowed_extensions: Vec<String>,
    /// Accepted declared MIME types
    pub allowed_mime_types: Vec<String>,
    /// Directory holding staged uploads
    pub staging_dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
            allowed_extensions: [".pdf", ".csv", ".xlsx", ".xls"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_mime_types: [
                "application/pdf",
                "text/csv",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.ms-excel",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            staging_dir: std::env::temp_dir().join("invoice-uploads"),
        }
    }
}

/// Format extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Trimmed PDF text shorter than this is treated as a scanned document
    pub min_pdf_text_chars: usize,
    /// Timeout for decoding a single file in seconds
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_pdf_text_chars: 50,
            timeout_secs: 60,
        }
    }
}

/// Which structured-extraction backend to call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: AnalyzerBackend,
    /// Base URL of the backend
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible backends)
    pub api_key_env: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Invoice text longer than this is truncated before prompting
    pub max_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: AnalyzerBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            timeout_secs: 120,
            max_retries: 0,
            max_input_chars: 100_000,
        }
    }
}
