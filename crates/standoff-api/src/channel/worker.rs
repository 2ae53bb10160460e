//! Sequential job loop for one session.
//!
//! Everything a job produces for a connection, narrative frames and error or
//! recording replies alike, is queued before the next job starts. A client
//! therefore sees the outcomes of its actions in the order it sent them.

use standoff_core::error::GameError;
use standoff_core::input::PlayerInput;
use standoff_protocol::{RecordingStatus, ServerMessage};
use standoff_session::application::command_handlers::{
    RecordingOutcome, handle_start_recording, handle_stop_recording, handle_submit_input,
};
use standoff_session::domain::commands::{StartRecording, StopRecording, SubmitInput};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use super::hub::{InputApplied, InputReply, Job, Outbound, SessionHub};
use super::messages::to_server_message;

/// Runs `jobs` one at a time until every sender is gone.
pub(crate) async fn run(hub: SessionHub, session_id: Uuid, mut jobs: mpsc::UnboundedReceiver<Job>) {
    debug!(%session_id, "session worker started");
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Input {
                correlation_id,
                input,
                reply,
            } => {
                let span = info_span!("session_input", %session_id, %correlation_id);
                let result = apply_input(&hub, session_id, correlation_id, input)
                    .instrument(span)
                    .await;
                match reply {
                    InputReply::Connection(outbound) => {
                        if let Err(e) = result {
                            deliver(&outbound, session_id, ServerMessage::from_error(&e));
                        }
                    }
                    InputReply::Caller(sender) => {
                        if sender.send(result).is_err() {
                            debug!(%session_id, "input reply dropped by caller");
                        }
                    }
                }
            }
            Job::Recording {
                correlation_id,
                status,
                outbound,
            } => {
                let frame = match record(&hub, session_id, correlation_id, status).await {
                    Ok(outcome) => ServerMessage::Recording {
                        recording: status,
                        recording_id: outcome.recording_id,
                        session_id: outcome.session_id,
                    },
                    Err(e) => {
                        warn!(%session_id, error = %e, code = e.code(), "recording action failed");
                        ServerMessage::from_error(&e)
                    }
                };
                deliver(&outbound, session_id, frame);
            }
        }
        if has_ended(&hub, session_id).await {
            hub.retire_worker(session_id).await;
        }
    }
    debug!(%session_id, "session worker stopped");
}

fn deliver(outbound: &Outbound, session_id: Uuid, frame: ServerMessage) {
    if outbound.send(frame).is_err() {
        debug!(%session_id, "connection gone before reply was sent");
    }
}

/// Whether the session is gone or finished, so no further job can change it.
async fn has_ended(hub: &SessionHub, session_id: Uuid) -> bool {
    match hub.inner.store.get(session_id).await {
        Ok(slot) => slot.is_retired() || slot.snapshot().await.is_terminal(),
        Err(_) => true,
    }
}

async fn apply_input(
    hub: &SessionHub,
    session_id: Uuid,
    correlation_id: Uuid,
    input: PlayerInput,
) -> Result<InputApplied, GameError> {
    let inner = &hub.inner;
    let command = SubmitInput {
        correlation_id,
        session_id,
        input,
    };
    let outcome = handle_submit_input(
        &command,
        inner.clock.as_ref(),
        &inner.store,
        inner.adapter.as_ref(),
        &inner.settings,
    )
    .await
    .inspect_err(|e| warn!(error = %e, code = e.code(), "input rejected"))?;

    let frames: Vec<_> = outcome.events.iter().map(to_server_message).collect();
    let published = frames.len();
    hub.publish(session_id, frames).await;

    Ok(InputApplied {
        session_id,
        generation: outcome.generation,
        events: published,
        ended: outcome.ended,
    })
}

async fn record(
    hub: &SessionHub,
    session_id: Uuid,
    correlation_id: Uuid,
    status: RecordingStatus,
) -> Result<RecordingOutcome, GameError> {
    let inner = &hub.inner;
    match status {
        RecordingStatus::Started => {
            let command = StartRecording {
                correlation_id,
                session_id,
            };
            handle_start_recording(&command, inner.clock.as_ref(), &inner.store).await
        }
        RecordingStatus::Stopped => {
            let command = StopRecording {
                correlation_id,
                session_id,
            };
            handle_stop_recording(&command, &inner.store).await
        }
    }
}
