use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata not found: {0}")]
    NotFound(String),

    #[error("Invalid metadata name: {0}")]
    InvalidName(String),

    #[error("Stored metadata document {name} is corrupt: {source}")]
    CorruptDocument {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode metadata document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience type alias
pub type MetadataResult<T> = Result<T, MetadataError>;

impl MetadataError {
    /// HTTP status and a stable error code for the response body.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            MetadataError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            MetadataError::InvalidName(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            MetadataError::CorruptDocument { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CORRUPT_DOCUMENT")
            }
            MetadataError::Encode(_) | MetadataError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
        }
    }
}

impl IntoResponse for MetadataError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = match &self {
            MetadataError::Io(_) | MetadataError::Encode(_) => {
                // Log the full detail server-side but don't expose paths to clients
                tracing::error!("Metadata storage error: {}", self);
                "An internal error occurred".to_string()
            }
            MetadataError::CorruptDocument { name, .. } => {
                tracing::error!("{}", self);
                format!("Stored metadata document {} is corrupt", name)
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
