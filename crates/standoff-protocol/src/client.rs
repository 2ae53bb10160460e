//! Client to server frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use standoff_core::emotion::EmotionSample;
use standoff_core::input::PlayerInput;
use thiserror::Error;
use uuid::Uuid;

/// A frame could not be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, or not a JSON object.
    #[error("malformed message: {0}")]
    Malformed(String),
    /// A control action with missing or unknown fields.
    #[error("invalid action: {0}")]
    InvalidAction(serde_json::Error),
    /// A content input with missing or mistyped fields.
    #[error("invalid input: {0}")]
    InvalidInput(serde_json::Error),
}

/// Control actions, keyed by the `action` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    /// Start a new session.
    Start,
    /// Replace a session with a fresh one.
    Restart { session_id: Uuid },
    /// The player started recording.
    RecordingStart { session_id: Uuid },
    /// The player stopped recording.
    RecordingStop { session_id: Uuid },
    /// Reattach to an existing session after a reconnect.
    Resume { session_id: Uuid },
    /// Close the channel.
    Stop,
}

/// A content-bearing input for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub session_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_text: Option<String>,
    /// Capture time; the server's receipt time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl InputMessage {
    /// Converts the frame into a player input, stamping it with `received_at`
    /// if the client sent no timestamp.
    #[must_use]
    pub fn into_input(self, received_at: DateTime<Utc>) -> PlayerInput {
        PlayerInput {
            emotion: self.emotion,
            speech_text: self.speech_text,
            timestamp: self.timestamp.unwrap_or(received_at),
        }
    }
}

/// Any frame a client may send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Control(ControlAction),
    Input(InputMessage),
}

impl ClientMessage {
    /// Parses one text frame.
    ///
    /// Frames with an `action` key are control actions; everything else is
    /// read as a content input.
    ///
    /// # Errors
    ///
    /// Returns a `ProtocolError` describing why the frame was rejected.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(ProtocolError::Malformed("expected a JSON object".to_owned()));
        }
        if value.get("action").is_some() {
            serde_json::from_value(value)
                .map(Self::Control)
                .map_err(ProtocolError::InvalidAction)
        } else {
            serde_json::from_value(value)
                .map(Self::Input)
                .map_err(ProtocolError::InvalidInput)
        }
    }

    /// The session the frame refers to, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Self::Control(ControlAction::Start | ControlAction::Stop) => None,
            Self::Control(
                ControlAction::Restart { session_id }
                | ControlAction::RecordingStart { session_id }
                | ControlAction::RecordingStop { session_id }
                | ControlAction::Resume { session_id },
            )
            | Self::Input(InputMessage { session_id, .. }) => Some(*session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_control_actions() {
        let id = Uuid::new_v4();
        assert_eq!(
            ClientMessage::parse(r#"{"action":"start"}"#).unwrap(),
            ClientMessage::Control(ControlAction::Start)
        );
        assert_eq!(
            ClientMessage::parse(&format!(r#"{{"action":"restart","session_id":"{id}"}}"#))
                .unwrap(),
            ClientMessage::Control(ControlAction::Restart { session_id: id })
        );
        assert_eq!(
            ClientMessage::parse(&format!(
                r#"{{"action":"recording_start","session_id":"{id}"}}"#
            ))
            .unwrap()
            .session_id(),
            Some(id)
        );
    }

    #[test]
    fn test_parse_input_defaults_timestamp_to_receipt_time() {
        // Arrange
        let id = Uuid::new_v4();
        let frame = format!(
            r#"{{"session_id":"{id}","speech_text":"Back off.","emotion":{{"angry":80.0,"neutral":20.0}}}}"#
        );
        let received_at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        // Act
        let ClientMessage::Input(message) = ClientMessage::parse(&frame).unwrap() else {
            panic!("expected an input frame");
        };
        let input = message.into_input(received_at);

        // Assert
        assert_eq!(input.timestamp, received_at);
        assert_eq!(input.spoken_text(), Some("Back off."));
        assert!(input.emotion.is_some());
    }

    #[test]
    fn test_parse_rejects_restart_without_session_id() {
        let result = ClientMessage::parse(r#"{"action":"restart"}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidAction(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let result = ClientMessage::parse(r#"{"action":"dance"}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidAction(_))));
    }

    #[test]
    fn test_parse_rejects_non_json_and_non_objects() {
        assert!(matches!(
            ClientMessage::parse("hello"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::parse("[1,2]"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_input_without_session_id() {
        let result = ClientMessage::parse(r#"{"speech_text":"hi"}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    #[test]
    fn test_control_action_serializes_with_action_key() {
        let json = serde_json::to_value(ClientMessage::Control(ControlAction::Start)).unwrap();
        assert_eq!(json, serde_json::json!({"action": "start"}));
    }
}
