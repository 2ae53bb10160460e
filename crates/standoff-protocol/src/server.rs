//! Server to client frames.
//!
//! Frames carry no explicit type tag; each variant has a key only it
//! requires. Narrative frames (dialog, achievement, game over) carry the
//! session `generation` and a per-session `sequence` so the client can drop
//! frames from a session it has already left.

use serde::{Deserialize, Serialize};
use standoff_core::error::GameError;
use standoff_core::scenario::{Achievement, Ending, Stage};
use standoff_core::suspicion::SuspicionLevel;
use uuid::Uuid;

/// Lifecycle notification for a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    Started,
    Stopped,
}

/// Any frame the server may send.
///
/// Variant order matters for decoding: a frame is read as the first variant
/// whose required keys it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// An NPC line.
    Dialog {
        dialog: String,
        npc_id: String,
        suspicion_level: SuspicionLevel,
        generation: u64,
        sequence: u64,
    },
    /// The session ended. Always the last narrative frame of a generation.
    GameOver {
        game_over: bool,
        ending_type: Ending,
        analysis: Option<String>,
        suspicion_level: SuspicionLevel,
        generation: u64,
        sequence: u64,
    },
    /// Achievements earned by the last input.
    Achievement {
        achievement_unlocked: Vec<Achievement>,
        generation: u64,
        sequence: u64,
    },
    /// An action failed.
    Error {
        error: String,
        message: String,
        retryable: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<Uuid>,
    },
    /// Recording acknowledgement.
    Recording {
        recording: RecordingStatus,
        recording_id: String,
        session_id: Uuid,
    },
    /// Reply to a resume: the session's current state.
    Resumed {
        resumed: Uuid,
        generation: u64,
        stage: Stage,
        suspicion_level: SuspicionLevel,
        game_over: bool,
    },
    /// Reply to start and restart.
    SessionStarted { session_id: Uuid, generation: u64 },
}

impl ServerMessage {
    /// An error frame for a failed action.
    #[must_use]
    pub fn from_error(error: &GameError) -> Self {
        Self::Error {
            error: error.code().to_owned(),
            message: error.to_string(),
            retryable: error.is_retryable(),
            session_id: error.session_id(),
        }
    }

    /// An error frame for a frame that could not be parsed.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::from_error(&GameError::Validation(message.into()))
    }

    /// The generation the frame belongs to. Error and recording frames
    /// belong to none.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Dialog { generation, .. }
            | Self::GameOver { generation, .. }
            | Self::Achievement { generation, .. }
            | Self::Resumed { generation, .. }
            | Self::SessionStarted { generation, .. } => Some(*generation),
            Self::Error { .. } | Self::Recording { .. } => None,
        }
    }

    /// Position within the session's narrative, for narrative frames.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::Dialog { sequence, .. }
            | Self::GameOver { sequence, .. }
            | Self::Achievement { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> ServerMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_dialog_frame_shape() {
        let message = ServerMessage::Dialog {
            dialog: "What are you looking at?".into(),
            npc_id: "thug".into(),
            suspicion_level: SuspicionLevel::new(3),
            generation: 2,
            sequence: 4,
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "dialog": "What are you looking at?",
                "npc_id": "thug",
                "suspicion_level": 3,
                "generation": 2,
                "sequence": 4
            })
        );
    }

    #[test]
    fn test_game_over_and_resumed_are_told_apart() {
        let game_over = decode(json!({
            "game_over": true,
            "ending_type": "failure",
            "analysis": null,
            "suspicion_level": 10,
            "generation": 1,
            "sequence": 9
        }));
        let resumed = decode(json!({
            "resumed": "6f1c1c55-3c2b-4f7e-9b8e-2b8b2f6d9a10",
            "generation": 1,
            "stage": "escalating",
            "suspicion_level": 4,
            "game_over": false
        }));

        assert!(matches!(
            game_over,
            ServerMessage::GameOver {
                ending_type: Ending::Failure,
                ..
            }
        ));
        assert!(matches!(resumed, ServerMessage::Resumed { game_over: false, .. }));
    }

    #[test]
    fn test_session_started_and_recording_are_told_apart() {
        let id = Uuid::new_v4();
        let started = decode(json!({"session_id": id, "generation": 7}));
        let recording = decode(json!({
            "recording": "started",
            "recording_id": "recording_x_1",
            "session_id": id
        }));

        assert_eq!(
            started,
            ServerMessage::SessionStarted {
                session_id: id,
                generation: 7
            }
        );
        assert!(matches!(
            recording,
            ServerMessage::Recording {
                recording: RecordingStatus::Started,
                ..
            }
        ));
        assert_eq!(recording.generation(), None);
    }

    #[test]
    fn test_error_frame_from_game_error() {
        let id = Uuid::new_v4();
        let message = ServerMessage::from_error(&GameError::AdapterTimeout {
            session_id: id,
            timeout_ms: 5000,
        });

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["error"], "adapter_timeout");
        assert_eq!(json["retryable"], true);
        assert_eq!(json["session_id"], json!(id));
        assert_eq!(decode(json), message);
    }

    #[test]
    fn test_validation_frame_omits_session_id() {
        let json = serde_json::to_value(ServerMessage::validation("bad frame")).unwrap();
        assert_eq!(json["error"], "validation_error");
        assert!(json.get("session_id").is_none());
    }
}
