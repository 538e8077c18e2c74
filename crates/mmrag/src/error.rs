//! Error types for the ingestion and query pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Who has to act on a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something we cannot use ("fix your file")
    Client,
    /// A backend or the store is down ("retry later")
    Service,
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (e.g. chunk overlap >= window)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source could not be read by its extractor
    #[error("Failed to extract '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// No extractor for the declared type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Malformed request (e.g. upload without a file part)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Extraction succeeded but yielded no text
    #[error("No text extracted from '{0}'")]
    NoContent(String),

    /// A single embedding call failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Embedding backend could not be initialized or reached
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Every unit of a document failed to embed
    #[error("No chunks or images could be embedded for '{0}'")]
    NoEmbeddedUnits(String),

    /// Vector store unreachable or rejected the write/search
    #[error("Vector store error: {0}")]
    IndexWrite(String),

    /// LLM call failed
    #[error("LLM error: {0}")]
    Llm(String),

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
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a model-unavailable error
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }

    /// Create a vector store error
    pub fn index_write(message: impl Into<String>) -> Self {
        Self::IndexWrite(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify the failure as the caller's problem or ours
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_)
            | Error::Extraction { .. }
            | Error::UnsupportedFileType(_)
            | Error::NoContent(_)
            | Error::InvalidRequest(_)
            | Error::Json(_) => ErrorKind::Client,
            Error::Embedding(_)
            | Error::ModelUnavailable(_)
            | Error::NoEmbeddedUnits(_)
            | Error::IndexWrite(_)
            | Error::Llm(_)
            | Error::Io(_)
            | Error::Http(_)
            | Error::Internal(_) => ErrorKind::Service,
        }
    }

    /// True when retrying the same input later may succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Service
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Extraction { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::NoContent(_) => (StatusCode::UNPROCESSABLE_ENTITY, "no_content"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            Error::ModelUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable"),
            Error::NoEmbeddedUnits(_) => (StatusCode::SERVICE_UNAVAILABLE, "no_embedded_units"),
            Error::IndexWrite(_) => (StatusCode::BAD_GATEWAY, "vector_store_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let kind = match self.kind() {
            ErrorKind::Client => "client",
            ErrorKind::Service => "service",
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "kind": kind,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
