//! Error types for the invoice intake service

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any processing (missing file, type, size, malformed body)
    InvalidInput,
    /// The uploaded bytes could not be decoded into text
    ExtractionFailure,
    /// The structured-extraction service failed or timed out
    UpstreamFailure,
    /// Staging, configuration or runtime failure on our side
    Internal,
}

/// Invoice intake errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Multipart request without an `invoice` file part
    #[error("No file uploaded")]
    MissingFile,

    /// Neither the extension nor the declared MIME type is accepted
    #[error("Unsupported file type. Please upload PDF, CSV, XLSX, or XLS.")]
    UnsupportedFileType {
        filename: String,
        mime_type: Option<String>,
    },

    /// Upload exceeded the size cap
    #[error("File too large. Maximum size is {}MB.", max_bytes / (1024 * 1024))]
    FileTooLarge { max_bytes: u64 },

    /// Malformed request body
    #[error("Invalid upload: {0}")]
    BadRequest(String),

    /// File decoding error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Structured-extraction service error
    #[error("Invoice analysis failed: {0}")]
    Analysis(String),

    /// Structured-extraction service did not answer in time
    #[error("Invoice analysis timed out after {secs}s")]
    AnalysisTimeout { secs: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify the error the way callers see it
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingFile
            | Error::UnsupportedFileType { .. }
            | Error::FileTooLarge { .. }
            | Error::BadRequest(_) => ErrorKind::InvalidInput,
            Error::FileParse { .. } => ErrorKind::ExtractionFailure,
            Error::Analysis(_) | Error::AnalysisTimeout { .. } | Error::Http(_) => {
                ErrorKind::UpstreamFailure
            }
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::ExtractionFailure
            | ErrorKind::UpstreamFailure
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Map a multipart read error, treating a tripped body limit as an oversized upload.
pub fn from_multipart(err: MultipartError, max_bytes: u64) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::FileTooLarge { max_bytes }
    } else {
        Error::BadRequest(err.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
