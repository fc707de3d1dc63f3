use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tts_core::TtsError;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed shape or range checks; no model work was done.
    #[error("{0}")]
    Validation(String),

    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    #[error("Unknown speaker: {requested}. Available: {}", .available.join(", "))]
    UnknownSpeaker {
        requested: String,
        available: Vec<String>,
    },

    #[error("TTS generation failed: {0}")]
    Synthesis(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<TtsError> for ApiError {
    fn from(e: TtsError) -> Self {
        match e {
            TtsError::ModelUnavailable(msg) => ApiError::ModelUnavailable(msg),
            TtsError::UnknownSpeaker {
                requested,
                available,
            } => ApiError::UnknownSpeaker {
                requested,
                available,
            },
            TtsError::Synthesis(msg) => ApiError::Synthesis(msg),
            TtsError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UnknownSpeaker { .. } | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Synthesis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.to_string();
        if status.is_server_error() {
            tracing::error!("{}", error_message);
        }

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
