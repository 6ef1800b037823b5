use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by API handlers, rendered as
/// `{error, message, path, timestamp}` JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound { path: String, message: String },

    #[error("{source:#}")]
    Internal {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn not_found(uri: &Uri, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            path: uri.path().to_string(),
            message: message.into(),
        }
    }

    pub fn internal(uri: &Uri, source: anyhow::Error) -> Self {
        ApiError::Internal {
            path: uri.path().to_string(),
            source,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::NotFound { path, .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", path),
            ApiError::Internal { path, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", path)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, path) = self.parts();
        let message = match &self {
            ApiError::NotFound { message, .. } => message.clone(),
            ApiError::Internal { source, .. } => {
                error!("Internal error on {}: {:#}", path, source);
                "An internal error occurred".to_string()
            }
        };
        let body = json!({
            "error": code,
            "message": message,
            "path": path,
            "timestamp": Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}
