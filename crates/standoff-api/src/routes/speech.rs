//! Speech synthesis proxy for the client's audio queue.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use standoff_core::speech::VoiceProfile;
use tracing::{instrument, warn};

use crate::error::SpeechApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: VoiceProfile,
}

/// POST /
///
/// Answers with the synthesised audio, typed by its content type.
#[instrument(skip(state, request), fields(voice = %request.voice.name))]
async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> Result<impl IntoResponse, SpeechApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(SpeechApiError::Invalid("text must not be blank".to_owned()));
    }
    let speech = state.speech.as_ref().ok_or(SpeechApiError::Unconfigured)?;

    let clip = speech
        .synthesize(text, &request.voice)
        .await
        .inspect_err(|e| warn!(error = %e, "speech synthesis failed"))?;

    Ok(([(header::CONTENT_TYPE, clip.content_type)], clip.data))
}

/// Returns the router for speech synthesis.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(synthesize))
}
