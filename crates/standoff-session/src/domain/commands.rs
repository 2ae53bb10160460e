//! Commands for the game session context.

use standoff_core::command::Command;
use standoff_core::input::PlayerInput;
use uuid::Uuid;

/// Command to start a brand-new session.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "session.start_game"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        None
    }
}

/// Command to abandon a session and start a fresh one in its place.
#[derive(Debug, Clone)]
pub struct RestartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session being replaced.
    pub session_id: Uuid,
}

impl Command for RestartGame {
    fn command_type(&self) -> &'static str {
        "session.restart_game"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}

/// Command to submit one emotion sample and/or utterance.
#[derive(Debug, Clone)]
pub struct SubmitInput {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session the input belongs to.
    pub session_id: Uuid,
    /// The input.
    pub input: PlayerInput,
}

impl Command for SubmitInput {
    fn command_type(&self) -> &'static str {
        "session.submit_input"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}

/// Command to mark the start of a player recording.
#[derive(Debug, Clone)]
pub struct StartRecording {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session being recorded.
    pub session_id: Uuid,
}

impl Command for StartRecording {
    fn command_type(&self) -> &'static str {
        "session.start_recording"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}

/// Command to mark the end of a player recording.
#[derive(Debug, Clone)]
pub struct StopRecording {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session being recorded.
    pub session_id: Uuid,
}

impl Command for StopRecording {
    fn command_type(&self) -> &'static str {
        "session.stop_recording"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}

/// Command to end a session and release it from the store.
#[derive(Debug, Clone)]
pub struct EndSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session to end.
    pub session_id: Uuid,
}

impl Command for EndSession {
    fn command_type(&self) -> &'static str {
        "session.end_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Option<Uuid> {
        Some(self.session_id)
    }
}
