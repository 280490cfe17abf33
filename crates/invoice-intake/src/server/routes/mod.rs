//! API routes for the intake server

pub mod analysis;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_request_bytes: usize) -> Router<AppState> {
    Router::new()
        // Upload with a body limit above the file cap so the gate reports oversize
        .route(
            "/invoice-analysis",
            post(analysis::analyze_invoice).layer(DefaultBodyLimit::max(max_request_bytes)),
        )
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let analyzer = state.pipeline().relay().analyzer();

    Json(serde_json::json!({
        "name": "invoice-intake",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Cloud invoice upload, text extraction and structured cost summary",
        "endpoints": {
            "POST /api/invoice-analysis": "Upload an invoice (multipart field 'invoice') and get a cost summary",
            "GET /api/info": "Service description",
            "GET /health": "Liveness probe",
            "GET /ready": "Readiness probe"
        },
        "upload": {
            "maxFileSize": config.upload.max_file_size,
            "allowedExtensions": config.upload.allowed_extensions,
            "allowedMimeTypes": config.upload.allowed_mime_types
        },
        "analyzer": {
            "backend": analyzer.name(),
            "model": analyzer.model()
        }
    }))
}
