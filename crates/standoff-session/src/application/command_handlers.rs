//! Command handlers for the game session context.
//!
//! Each handler looks up the session slot, runs the state machine and
//! stores the result. Decision calls for one session are serialized by the
//! slot's decision gate; the map lock is never held while waiting on them.

use standoff_core::clock::Clock;
use standoff_core::decision::DecisionAdapter;
use standoff_core::error::GameError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::settings::SessionSettings;
use crate::application::store::{SessionSlot, SessionStore};
use crate::domain::aggregates::{GameSession, Transition};
use crate::domain::commands::{
    EndSession, RestartGame, StartGame, StartRecording, StopRecording, SubmitInput,
};
use crate::domain::events::NarrativeEvent;

/// Result of a successfully handled session command.
#[derive(Debug)]
pub struct CommandOutcome {
    /// The session affected or created by the command.
    pub session_id: Uuid,
    /// Generation of that session.
    pub generation: u64,
    /// Events to deliver, in order.
    pub events: Vec<NarrativeEvent>,
    /// Whether the session reached an ending.
    pub ended: bool,
}

/// Result of a recording command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingOutcome {
    /// The recorded session.
    pub session_id: Uuid,
    /// Identifier of the recording.
    pub recording_id: String,
}

fn ensure_live(slot: &SessionSlot, session_id: Uuid) -> Result<(), GameError> {
    if slot.is_retired() {
        return Err(GameError::InvalidTransition {
            session_id,
            reason: "session was replaced or ended".to_owned(),
        });
    }
    Ok(())
}

/// Handles the `StartGame` command: creates a fresh session with a new id and
/// generation and stores it.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if the new id collides with a stored one.
pub async fn handle_start_game(
    command: &StartGame,
    clock: &dyn Clock,
    store: &SessionStore,
    settings: &SessionSettings,
) -> Result<CommandOutcome, GameError> {
    let session_id = Uuid::new_v4();
    let generation = store.next_generation();
    let Transition { session, events } = GameSession::begin(
        session_id,
        generation,
        &settings.script,
        command.correlation_id,
        clock,
    );
    store.insert(session).await?;

    info!(%session_id, generation, correlation_id = %command.correlation_id, "session started");
    Ok(CommandOutcome {
        session_id,
        generation,
        events,
        ended: false,
    })
}

/// Handles the `RestartGame` command: retires the referenced session, if it
/// exists, and starts a fresh one in its place.
///
/// A decision still in flight for the retired session is discarded when it
/// returns.
///
/// # Errors
///
/// Returns `GameError::Infrastructure` if the new id collides with a stored one.
pub async fn handle_restart_game(
    command: &RestartGame,
    clock: &dyn Clock,
    store: &SessionStore,
    settings: &SessionSettings,
) -> Result<CommandOutcome, GameError> {
    match store.remove(command.session_id).await {
        Some(slot) => {
            slot.retire().await;
            info!(session_id = %command.session_id, "session retired by restart");
        }
        None => {
            debug!(session_id = %command.session_id, "restart of unknown session");
        }
    }

    handle_start_game(
        &StartGame {
            correlation_id: command.correlation_id,
        },
        clock,
        store,
        settings,
    )
    .await
}

/// Handles the `SubmitInput` command: consults the decision process once and
/// applies its answer.
///
/// At most one decision call per session is in flight; later inputs wait
/// their turn in arrival order and see the state produced by earlier ones.
/// A failed or timed-out call leaves the session unchanged.
///
/// # Errors
///
/// Returns `GameError::Validation` if the input carries no content.
/// Returns `GameError::UnknownSession` if the session does not exist.
/// Returns `GameError::InvalidTransition` if the session has ended or was
/// replaced, including while the decision was in flight.
/// Returns `GameError::TransportDisconnected` if no client is attached.
/// Returns `GameError::AdapterTimeout` or `GameError::AdapterFailure` if the
/// decision process did not produce a decision.
pub async fn handle_submit_input(
    command: &SubmitInput,
    clock: &dyn Clock,
    store: &SessionStore,
    adapter: &dyn DecisionAdapter,
    settings: &SessionSettings,
) -> Result<CommandOutcome, GameError> {
    let session_id = command.session_id;
    command.input.validate()?;
    let slot = store.get(session_id).await?;

    let _gate = slot.decision_gate().await;
    ensure_live(&slot, session_id)?;
    let snapshot = slot.snapshot().await;
    snapshot.ensure_accepts_input()?;
    snapshot.ensure_connected()?;

    let context = snapshot.decision_context(&settings.script);
    let decided = tokio::time::timeout(
        settings.decision_timeout,
        adapter.decide(&context, &command.input),
    )
    .await;
    let decision = match decided {
        Ok(Ok(decision)) => decision,
        Ok(Err(e)) => {
            warn!(%session_id, error = %e, "decision process failed");
            return Err(GameError::AdapterFailure {
                session_id,
                message: e.to_string(),
            });
        }
        Err(_) => {
            let timeout_ms = u64::try_from(settings.decision_timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(%session_id, timeout_ms, "decision process timed out");
            return Err(GameError::AdapterTimeout {
                session_id,
                timeout_ms,
            });
        }
    };

    let mut state = slot.state().await;
    if let Err(e) = ensure_live(&slot, session_id) {
        info!(%session_id, "discarding decision for retired session");
        return Err(e);
    }
    let transition = state.apply_decision(&command.input, decision, command.correlation_id, clock)?;
    *state = transition.session;

    info!(
        %session_id,
        generation = state.generation(),
        stage = ?state.stage(),
        suspicion = state.suspicion().value(),
        events = transition.events.len(),
        "input applied"
    );
    Ok(CommandOutcome {
        session_id,
        generation: state.generation(),
        events: transition.events,
        ended: state.is_terminal(),
    })
}

/// Handles the `StartRecording` command.
///
/// # Errors
///
/// Returns `GameError::UnknownSession` if the session does not exist.
/// Returns `GameError::InvalidTransition` if the session has ended, was
/// replaced, or is already recording.
pub async fn handle_start_recording(
    command: &StartRecording,
    clock: &dyn Clock,
    store: &SessionStore,
) -> Result<RecordingOutcome, GameError> {
    let slot = store.get(command.session_id).await?;
    ensure_live(&slot, command.session_id)?;
    let recording_id = slot.state().await.start_recording(clock)?;

    debug!(session_id = %command.session_id, %recording_id, "recording started");
    Ok(RecordingOutcome {
        session_id: command.session_id,
        recording_id,
    })
}

/// Handles the `StopRecording` command.
///
/// # Errors
///
/// Returns `GameError::UnknownSession` if the session does not exist.
/// Returns `GameError::InvalidTransition` if nothing is being recorded.
pub async fn handle_stop_recording(
    command: &StopRecording,
    store: &SessionStore,
) -> Result<RecordingOutcome, GameError> {
    let slot = store.get(command.session_id).await?;
    ensure_live(&slot, command.session_id)?;
    let recording_id = slot.state().await.stop_recording()?;

    debug!(session_id = %command.session_id, %recording_id, "recording stopped");
    Ok(RecordingOutcome {
        session_id: command.session_id,
        recording_id,
    })
}

/// Handles the `EndSession` command: retires the session and removes it from
/// the store.
///
/// # Errors
///
/// Returns `GameError::UnknownSession` if the session does not exist.
pub async fn handle_end_session(
    command: &EndSession,
    store: &SessionStore,
) -> Result<(), GameError> {
    let slot = store
        .remove(command.session_id)
        .await
        .ok_or(GameError::UnknownSession(command.session_id))?;
    slot.retire().await;

    info!(session_id = %command.session_id, correlation_id = %command.correlation_id, "session ended");
    Ok(())
}

/// Attaches or detaches the client of a session and returns the resulting
/// state.
///
/// # Errors
///
/// Returns `GameError::UnknownSession` if the session does not exist.
pub async fn handle_connection_change(
    session_id: Uuid,
    connected: bool,
    store: &SessionStore,
) -> Result<GameSession, GameError> {
    let slot = store.get(session_id).await?;
    let mut state = slot.state().await;
    if connected {
        state.attach_connection();
    } else {
        state.detach_connection();
    }
    debug!(%session_id, connected, "connection state changed");
    Ok(state.clone())
}
