//! Query handlers for the game session context.
//!
//! Queries copy the current session state into read-only view DTOs; they
//! never wait on a decision in flight.

use chrono::{DateTime, Utc};
use serde::Serialize;
use standoff_core::error::GameError;
use standoff_core::scenario::{Achievement, Ending, Npc, Stage, Turn};
use standoff_core::suspicion::SuspicionLevel;
use uuid::Uuid;

use crate::application::store::SessionStore;
use crate::domain::aggregates::{ConnectionState, RecordingState};

/// Read-only view of one session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: Uuid,
    /// Generation of this session instance.
    pub generation: u64,
    /// Number of decisions applied.
    pub version: u64,
    pub stage: Stage,
    pub suspicion_level: SuspicionLevel,
    pub ending: Option<Ending>,
    pub analysis: Option<String>,
    /// Every line spoken so far, oldest first.
    pub history: Vec<Turn>,
    pub achievements: Vec<Achievement>,
    pub npcs: Vec<Npc>,
    /// Whether a client is attached.
    pub connected: bool,
    pub recording: RecordingState,
    /// Lines the player has spoken.
    pub dialog_exchanges: usize,
    /// Whether the session has been replaced or ended.
    pub retired: bool,
    pub created_at: DateTime<Utc>,
}

/// One row of the session list.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub generation: u64,
    pub stage: Stage,
    pub suspicion_level: SuspicionLevel,
    pub game_over: bool,
    pub connected: bool,
}

/// Retrieves a session by id.
///
/// # Errors
///
/// Returns `GameError::UnknownSession` if no session has this id.
pub async fn get_session_by_id(
    session_id: Uuid,
    store: &SessionStore,
) -> Result<SessionView, GameError> {
    let slot = store.get(session_id).await?;
    let retired = slot.is_retired();
    let session = slot.snapshot().await;
    Ok(SessionView {
        session_id,
        generation: session.generation(),
        version: session.version(),
        stage: session.stage(),
        suspicion_level: session.suspicion(),
        ending: session.ending(),
        analysis: session.analysis().map(str::to_owned),
        history: session.history().to_vec(),
        achievements: session.achievements().to_vec(),
        npcs: session.npcs().to_vec(),
        connected: session.connection() == ConnectionState::Connected,
        recording: session.recording().clone(),
        dialog_exchanges: session.dialog_exchanges(),
        retired,
        created_at: session.created_at(),
    })
}

/// Lists every live session, oldest generation first.
pub async fn list_sessions(store: &SessionStore) -> Vec<SessionSummary> {
    let mut summaries = Vec::new();
    for session_id in store.ids().await {
        // A session removed between listing ids and reading it is skipped.
        let Ok(slot) = store.get(session_id).await else {
            continue;
        };
        let session = slot.snapshot().await;
        summaries.push(SessionSummary {
            session_id,
            generation: session.generation(),
            stage: session.stage(),
            suspicion_level: session.suspicion(),
            game_over: session.is_terminal(),
            connected: session.connection() == ConnectionState::Connected,
        });
    }
    summaries.sort_by_key(|summary| summary.generation);
    summaries
}
