//! Application state for the intake server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::processing::InvoicePipeline;
use crate::providers::{build_analyzer, InvoiceAnalyzer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Upload gate, extractor and relay
    pipeline: InvoicePipeline,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state with the analyzer selected in configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!(
            "Initializing invoice intake state (backend: {:?})...",
            config.llm.backend
        );
        let analyzer = build_analyzer(&config.llm)?;
        Ok(Self::with_analyzer(config, analyzer))
    }

    /// Create state around an existing analyzer
    pub fn with_analyzer(config: AppConfig, analyzer: Arc<dyn InvoiceAnalyzer>) -> Self {
        let pipeline = InvoicePipeline::new(&config, analyzer);
        tracing::info!(
            staging_dir = %config.upload.staging_dir.display(),
            max_file_size = config.upload.max_file_size,
            "Upload gate initialized"
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the invoice pipeline
    pub fn pipeline(&self) -> &InvoicePipeline {
        &self.inner.pipeline
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
