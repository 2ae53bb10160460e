//! Routes for the game session context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use standoff_core::emotion::EmotionSample;
use standoff_core::input::PlayerInput;
use tracing::{info, instrument};
use uuid::Uuid;

use standoff_session::application::command_handlers;
use standoff_session::application::query_handlers::{self, SessionSummary, SessionView};
use standoff_session::domain::commands;

use crate::channel::hub::await_reply;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{session_id}/inputs.
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    #[serde(default)]
    pub emotion: Option<EmotionSample>,
    #[serde(default)]
    pub speech_text: Option<String>,
    /// Capture time; the server's receipt time when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Response body returned after an input is applied.
#[derive(Debug, Serialize)]
pub struct InputResponse {
    pub session_id: Uuid,
    pub generation: u64,
    /// Narrative frames pushed to the session's connection.
    pub events_published: usize,
    pub game_over: bool,
}

/// GET /
#[instrument(skip(state))]
async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(query_handlers::list_sessions(&state.store).await)
}

/// GET /{session_id}
#[instrument(skip(state), fields(session_id = %session_id))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_by_id(session_id, &state.store).await?;
    Ok(Json(view))
}

/// DELETE /{session_id}
#[instrument(skip(state), fields(session_id = %session_id))]
async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::EndSession {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling end_session command");

    command_handlers::handle_end_session(&command, &state.store).await?;
    state.hub.forget(session_id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /{session_id}/inputs
///
/// Runs through the same per-session queue as channel inputs. Narrative
/// frames still go to the session's connection; the response only reports
/// the outcome.
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn submit_input(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<InputRequest>,
) -> Result<Json<InputResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling submit_input command");

    let input = PlayerInput {
        emotion: request.emotion,
        speech_text: request.speech_text,
        timestamp: request.timestamp.unwrap_or_else(|| state.clock.now()),
    };
    let reply = state
        .hub
        .submit_input(session_id, correlation_id, input)
        .await?;
    let applied = await_reply(reply).await?;

    Ok(Json(InputResponse {
        session_id: applied.session_id,
        generation: applied.generation,
        events_published: applied.events,
        game_over: applied.ended,
    }))
}

/// Returns the router for the session context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/{session_id}", get(get_session).delete(end_session))
        .route("/{session_id}/inputs", post(submit_input))
}
