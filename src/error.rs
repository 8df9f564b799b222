use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// Pipeline stages each have their own variant so a failed run can report
/// where it stopped. `PosterLookup` is only ever logged; the poster stage
/// degrades to a missing poster instead of failing the run.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Malformed model output: {reason}")]
    MalformedModelOutput { reason: String, raw: String },

    #[error("Poster lookup error: {0}")]
    PosterLookup(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timed out while {stage}")]
    Timeout { stage: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        AppError::MalformedModelOutput {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Embedding(_)
            | AppError::Retrieval(_)
            | AppError::Completion(_)
            | AppError::MalformedModelOutput { .. }
            | AppError::PosterLookup(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Ingest(_)
            | AppError::Configuration(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
