//! Narrative events as wire frames.

use standoff_protocol::ServerMessage;
use standoff_session::domain::events::{NarrativeEvent, NarrativeEventKind};

/// Converts a narrative event into the frame sent to the client.
#[must_use]
pub fn to_server_message(event: &NarrativeEvent) -> ServerMessage {
    let generation = event.metadata.generation;
    let sequence = event.metadata.sequence_number;
    match &event.kind {
        NarrativeEventKind::DialogSpoken(dialog) => ServerMessage::Dialog {
            dialog: dialog.text.clone(),
            npc_id: dialog.speaker_id.clone(),
            suspicion_level: dialog.suspicion_level,
            generation,
            sequence,
        },
        NarrativeEventKind::AchievementsUnlocked(unlocked) => ServerMessage::Achievement {
            achievement_unlocked: unlocked.achievements.clone(),
            generation,
            sequence,
        },
        NarrativeEventKind::GameEnded(ended) => ServerMessage::GameOver {
            game_over: true,
            ending_type: ended.ending,
            analysis: ended.analysis.clone(),
            suspicion_level: ended.suspicion_level,
            generation,
            sequence,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use standoff_core::event::EventMetadata;
    use standoff_core::scenario::Ending;
    use standoff_core::suspicion::SuspicionLevel;
    use standoff_session::domain::events::GameEnded;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_game_ended_becomes_game_over_frame() {
        let event = NarrativeEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                generation: 3,
                sequence_number: 12,
                correlation_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
            },
            kind: NarrativeEventKind::GameEnded(GameEnded {
                ending: Ending::Success,
                analysis: Some("Calm and confident.".into()),
                suspicion_level: SuspicionLevel::new(1),
            }),
        };

        let json = serde_json::to_value(to_server_message(&event)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "game_over": true,
                "ending_type": "success",
                "analysis": "Calm and confident.",
                "suspicion_level": 1,
                "generation": 3,
                "sequence": 12
            })
        );
    }
}
