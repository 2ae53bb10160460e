//! One client connection: turns client frames into session actions.
//!
//! Lifecycle actions (start, restart, resume) are answered inline, so their
//! replies always precede any narrative frame of the new session. Inputs and
//! recordings go through the session's worker, which also reports their
//! failures on this connection's queue.

use std::collections::HashSet;

use standoff_core::error::GameError;
use standoff_protocol::{ClientMessage, ControlAction, InputMessage, RecordingStatus, ServerMessage};
use standoff_session::application::command_handlers::{
    CommandOutcome, handle_connection_change, handle_restart_game, handle_start_game,
};
use standoff_session::domain::aggregates::GameSession;
use standoff_session::domain::commands::{RestartGame, StartGame};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::hub::Outbound;
use super::messages::to_server_message;
use crate::state::AppState;

/// What the socket loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFlow {
    Continue,
    Close,
}

/// Per-socket state: the sessions this connection has attached.
pub struct Connection {
    id: Uuid,
    state: AppState,
    outbound: Outbound,
    sessions: HashSet<Uuid>,
}

impl Connection {
    #[must_use]
    pub fn new(state: AppState, outbound: Outbound) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            outbound,
            sessions: HashSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Parses and handles one text frame. Unparseable frames are answered
    /// with a validation error and the connection stays open.
    pub async fn handle_frame(&mut self, frame: &str) -> ConnectionFlow {
        match ClientMessage::parse(frame) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                debug!(connection_id = %self.id, error = %e, "rejected frame");
                self.send(ServerMessage::validation(e.to_string()));
                ConnectionFlow::Continue
            }
        }
    }

    #[instrument(skip(self, message), fields(connection_id = %self.id, session_id = tracing::field::Empty))]
    pub async fn handle(&mut self, message: ClientMessage) -> ConnectionFlow {
        if let Some(session_id) = message.session_id() {
            tracing::Span::current().record("session_id", tracing::field::display(session_id));
        }
        let correlation_id = Uuid::new_v4();
        let result = match message {
            ClientMessage::Control(ControlAction::Stop) => return ConnectionFlow::Close,
            ClientMessage::Control(ControlAction::Start) => self.start(correlation_id).await,
            ClientMessage::Control(ControlAction::Restart { session_id }) => {
                self.restart(session_id, correlation_id).await
            }
            ClientMessage::Control(ControlAction::Resume { session_id }) => {
                self.resume(session_id).await
            }
            ClientMessage::Control(ControlAction::RecordingStart { session_id }) => {
                self.record(session_id, correlation_id, RecordingStatus::Started)
                    .await
            }
            ClientMessage::Control(ControlAction::RecordingStop { session_id }) => {
                self.record(session_id, correlation_id, RecordingStatus::Stopped)
                    .await
            }
            ClientMessage::Input(input) => self.input(input, correlation_id).await,
        };
        if let Err(e) = result {
            warn!(error = %e, code = e.code(), "action failed");
            self.send(ServerMessage::from_error(&e));
        }
        ConnectionFlow::Continue
    }

    async fn start(&mut self, correlation_id: Uuid) -> Result<(), GameError> {
        let outcome = handle_start_game(
            &StartGame { correlation_id },
            self.state.clock.as_ref(),
            &self.state.store,
            &self.state.settings,
        )
        .await?;
        self.announce(outcome).await
    }

    async fn restart(&mut self, session_id: Uuid, correlation_id: Uuid) -> Result<(), GameError> {
        let outcome = handle_restart_game(
            &RestartGame {
                correlation_id,
                session_id,
            },
            self.state.clock.as_ref(),
            &self.state.store,
            &self.state.settings,
        )
        .await?;
        self.state.hub.forget(session_id).await;
        self.sessions.remove(&session_id);
        self.announce(outcome).await
    }

    async fn announce(&mut self, outcome: CommandOutcome) -> Result<(), GameError> {
        self.attach(outcome.session_id).await?;
        self.send(ServerMessage::SessionStarted {
            session_id: outcome.session_id,
            generation: outcome.generation,
        });
        for event in &outcome.events {
            self.send(to_server_message(event));
        }
        Ok(())
    }

    async fn resume(&mut self, session_id: Uuid) -> Result<(), GameError> {
        let session = self.attach(session_id).await?;
        info!(%session_id, generation = session.generation(), "session resumed");
        self.send(ServerMessage::Resumed {
            resumed: session_id,
            generation: session.generation(),
            stage: session.stage(),
            suspicion_level: session.suspicion(),
            game_over: session.is_terminal(),
        });
        Ok(())
    }

    async fn input(&mut self, message: InputMessage, correlation_id: Uuid) -> Result<(), GameError> {
        let session_id = message.session_id;
        self.ensure_attached(session_id).await?;
        let input = message.into_input(self.state.clock.now());
        self.state
            .hub
            .submit_input_from(session_id, correlation_id, input, self.outbound.clone())
            .await
    }

    async fn record(
        &mut self,
        session_id: Uuid,
        correlation_id: Uuid,
        status: RecordingStatus,
    ) -> Result<(), GameError> {
        self.ensure_attached(session_id).await?;
        self.state
            .hub
            .record(session_id, correlation_id, status, self.outbound.clone())
            .await
    }

    async fn ensure_attached(&mut self, session_id: Uuid) -> Result<(), GameError> {
        if !self.sessions.contains(&session_id) {
            self.attach(session_id).await?;
        }
        Ok(())
    }

    async fn attach(
        &mut self,
        session_id: Uuid,
    ) -> Result<GameSession, GameError> {
        let session = handle_connection_change(session_id, true, &self.state.store).await?;
        self.state
            .hub
            .link(session_id, self.id, self.outbound.clone())
            .await;
        self.sessions.insert(session_id);
        Ok(session)
    }

    /// Detaches every session this connection still owns. Sessions taken
    /// over by another connection are left alone.
    pub async fn close(self) {
        for session_id in self.sessions {
            if !self.state.hub.unlink(session_id, self.id).await {
                continue;
            }
            if let Err(e) = handle_connection_change(session_id, false, &self.state.store).await {
                debug!(%session_id, error = %e, "session gone before detach");
            }
        }
        debug!(connection_id = %self.id, "connection closed");
    }

    fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).is_err() {
            debug!(connection_id = %self.id, "outbound queue closed");
        }
    }
}
