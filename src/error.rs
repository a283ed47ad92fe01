//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::classifier::ClassifierError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Readiness errors (labels or model missing)
    NotConfigured(String),

    // Request errors (missing file, undecodable image)
    InvalidInput(String),

    // Model invocation errors
    InferenceFailure(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotConfigured(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InferenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::InferenceFailure(msg) => write!(f, "Inference failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::NotConfigured(msg) => json!({
                "detail": msg,
                "error": "not_configured",
            }),
            AppError::InvalidInput(msg) => json!({
                "detail": msg,
                "error": "invalid_input",
            }),
            AppError::InferenceFailure(msg) => {
                tracing::error!("Inference error: {}", msg);
                json!({
                    "detail": "Inference failed",
                    "error": msg,
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        AppError::InferenceFailure(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InferenceFailure(format!("inference task aborted: {}", err))
    }
}
