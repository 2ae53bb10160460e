//! Standoff — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use standoff_core::error::GameError;
use standoff_core::speech::SpeechError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Whether repeating the request may succeed.
    pub retryable: bool,
}

/// HTTP-layer wrapper around `GameError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GameError::UnknownSession(_) => StatusCode::NOT_FOUND,
            GameError::InvalidTransition { .. } | GameError::TransportDisconnected(_) => {
                StatusCode::CONFLICT
            }
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            GameError::AdapterTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GameError::AdapterFailure { .. } => StatusCode::BAD_GATEWAY,
            GameError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.0.code(),
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

/// Failures of the speech synthesis route.
#[derive(Debug, Error)]
pub enum SpeechApiError {
    /// The request cannot be voiced as sent.
    #[error("{0}")]
    Invalid(String),

    /// No text-to-speech service is configured.
    #[error("speech synthesis is not configured")]
    Unconfigured,

    /// The text-to-speech service failed.
    #[error(transparent)]
    Upstream(#[from] SpeechError),
}

impl IntoResponse for SpeechApiError {
    fn into_response(self) -> Response {
        let (status, error, retryable) = match &self {
            Self::Invalid(_) => (StatusCode::BAD_REQUEST, "validation_error", false),
            Self::Unconfigured => (StatusCode::SERVICE_UNAVAILABLE, "speech_unavailable", false),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "speech_failed", true),
        };

        let body = ErrorBody {
            error,
            message: self.to_string(),
            retryable,
        };

        (status, Json(body)).into_response()
    }
}
