use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Text store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Similarity query error: {0}")]
    QueryService(String),

    /// Aggregation was asked to average zero vectors
    #[error("Cannot aggregate an empty set of embeddings")]
    EmptyInput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::EmbeddingService(_) | AppError::QueryService(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::EmptyInput => {
                tracing::error!(error = %self, "Internal contract violation");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
