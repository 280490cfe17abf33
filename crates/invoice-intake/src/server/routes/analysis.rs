//! Invoice analysis endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{from_multipart, Error, Result};
use crate::server::state::AppState;
use crate::types::AnalysisResult;

/// Multipart field carrying the invoice
const INVOICE_FIELD: &str = "invoice";

/// POST /api/invoice-analysis - Upload an invoice and return its cost summary
pub async fn analyze_invoice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "invoice_analysis",
        %request_id,
        filename = tracing::field::Empty,
        size_bytes = tracing::field::Empty
    );

    let result = handle_upload(&state, multipart).instrument(span.clone()).await;

    let _enter = span.enter();
    match &result {
        Ok(_) => tracing::info!("Invoice analysis succeeded"),
        Err(e) if e.status().is_server_error() => {
            tracing::error!(error = %e, kind = ?e.kind(), "Invoice analysis failed")
        }
        Err(e) => tracing::info!(error = %e, "Invoice upload rejected"),
    }

    result.map(Json)
}

async fn handle_upload(state: &AppState, mut multipart: Multipart) -> Result<AnalysisResult> {
    let pipeline = state.pipeline();
    let max_bytes = pipeline.gate().max_bytes();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| from_multipart(e, max_bytes))?
    {
        if field.name() != Some(INVOICE_FIELD) {
            tracing::debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or(INVOICE_FIELD).to_string();
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string));

        tracing::Span::current().record("filename", filename.as_str());

        // Type check happens here, before any body byte is read
        let mut writer = pipeline.gate().open(&filename, mime_type).await?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| from_multipart(e, max_bytes))?
        {
            writer.write_chunk(&chunk).await?;
        }
        let staged = writer.finish().await?;

        tracing::Span::current().record("size_bytes", staged.upload().size_bytes);
        tracing::info!("Invoice staged, extracting");

        return pipeline.analyze(staged).await;
    }

    Err(Error::MissingFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, UploadConfig};
    use crate::providers::InvoiceAnalyzer;
    use crate::server::InvoiceServer;
    use crate::test_support::missing_font_pdf;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Arc;

    /// Returns a fixed summary and records what it was sent
    struct StubAnalyzer {
        response: Value,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl StubAnalyzer {
        fn new(response: Value) -> Arc<Self> {
            Arc::new(Self {
                response,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InvoiceAnalyzer for StubAnalyzer {
        async fn analyze(&self, content: &str, filename: &str) -> Result<AnalysisResult> {
            self.seen
                .lock()
                .push((content.to_string(), filename.to_string()));
            AnalysisResult::from_value(self.response.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl InvoiceAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _content: &str, _filename: &str) -> Result<AnalysisResult> {
            Err(Error::analysis("Chat completion failed: HTTP 503: overloaded"))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "none"
        }
    }

    fn stub_summary() -> Value {
        json!({
            "score": 78,
            "spendCoverage": ["Compute", "Storage", "Network"],
            "aiSignals": false,
            "wasteSignals": "Idle/overprovision indicators detected",
            "commitmentCoverage": "On-demand heavy: Medium",
            "optimizationPotential": "Estimated: 12-28%",
            "vendorExtra": {"accountId": "42"}
        })
    }

    fn test_app(staging: &Path, analyzer: Arc<dyn InvoiceAnalyzer>) -> TestServer {
        let config = AppConfig {
            upload: UploadConfig {
                staging_dir: staging.to_path_buf(),
                ..UploadConfig::default()
            },
            ..AppConfig::default()
        };
        let state = AppState::with_analyzer(config, analyzer);
        TestServer::new(InvoiceServer::with_state(state).router()).unwrap()
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    fn invoice_form(bytes: Vec<u8>, filename: &str) -> MultipartForm {
        MultipartForm::new().add_part("invoice", Part::bytes(bytes).file_name(filename))
    }

    #[tokio::test]
    async fn csv_upload_returns_stub_summary_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = StubAnalyzer::new(stub_summary());
        let app = test_app(dir.path(), analyzer.clone());

        let part = Part::bytes(b"a,b\n1,2\n".to_vec())
            .file_name("report.csv")
            .mime_type("text/csv");
        let response = app
            .post("/api/invoice-analysis")
            .multipart(MultipartForm::new().add_part("invoice", part))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), stub_summary());
        assert_eq!(
            analyzer.seen.lock().as_slice(),
            &[("a,b\n1,2\n".to_string(), "report.csv".to_string())]
        );
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn oversized_pdf_is_rejected_with_size_message() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = StubAnalyzer::new(stub_summary());
        let app = test_app(dir.path(), analyzer.clone());

        let big = vec![b'%'; 25 * 1024 * 1024];
        let response = app
            .post("/api/invoice-analysis")
            .multipart(invoice_form(big, "huge.pdf"))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>(),
            json!({"error": "File too large. Maximum size is 20MB."})
        );
        assert!(analyzer.seen.lock().is_empty());
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_invoice_field_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), StubAnalyzer::new(stub_summary()));

        let response = app
            .post("/api/invoice-analysis")
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>(), json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), StubAnalyzer::new(stub_summary()));

        let part = Part::bytes(b"PK\x03\x04".to_vec())
            .file_name("contract.docx")
            .mime_type("application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        let response = app
            .post("/api/invoice-analysis")
            .multipart(MultipartForm::new().add_part("invoice", part))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>(),
            json!({"error": "Unsupported file type. Please upload PDF, CSV, XLSX, or XLS."})
        );
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn corrupt_pdf_is_server_error_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = StubAnalyzer::new(stub_summary());
        let app = test_app(dir.path(), analyzer.clone());

        let response = app
            .post("/api/invoice-analysis")
            .multipart(invoice_form(b"%PDF-1.7 this is not a real pdf".to_vec(), "broken.pdf"))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert!(body["error"].as_str().unwrap().contains("broken.pdf"));
        assert!(analyzer.seen.lock().is_empty());
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn pdf_decoder_panic_still_answers_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = StubAnalyzer::new(stub_summary());
        let app = test_app(dir.path(), analyzer.clone());

        let response = app
            .post("/api/invoice-analysis")
            .multipart(invoice_form(missing_font_pdf(), "bill.pdf"))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), stub_summary());
        let seen = analyzer.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.starts_with("[PDF file: bill.pdf]\n"));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_server_error_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), Arc::new(FailingAnalyzer));

        let response = app
            .post("/api/invoice-analysis")
            .multipart(invoice_form(b"service,cost\nEC2,10\n".to_vec(), "bill.csv"))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert!(body["error"].as_str().unwrap().contains("HTTP 503"));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn mime_alone_admits_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = StubAnalyzer::new(stub_summary());
        let app = test_app(dir.path(), analyzer.clone());

        let part = Part::bytes(b"vendor,total\nAcme,5\n".to_vec())
            .file_name("export")
            .mime_type("text/csv");
        let response = app
            .post("/api/invoice-analysis")
            .multipart(MultipartForm::new().add_part("invoice", part))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(analyzer.seen.lock()[0].0, "vendor,total\nAcme,5\n");
    }

    #[tokio::test]
    async fn info_describes_service() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), StubAnalyzer::new(stub_summary()));

        let body = app.get("/api/info").await.json::<Value>();
        assert_eq!(body["name"], "invoice-intake");
        assert_eq!(body["upload"]["maxFileSize"], 20 * 1024 * 1024);
        assert_eq!(body["analyzer"]["backend"], "stub");
    }
}
