//! Narrative events for the game session context.
//!
//! These are produced by the state machine and delivered to the client in
//! production order. They are not persisted.

use serde::{Deserialize, Serialize};
use standoff_core::event::{DomainEvent, EventMetadata};
use standoff_core::scenario::{Achievement, Ending};
use standoff_core::suspicion::SuspicionLevel;

/// Emitted for every line an NPC speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSpoken {
    /// The NPC speaking.
    pub speaker_id: String,
    /// The line.
    pub text: String,
    /// Suspicion after the decision that produced the line.
    pub suspicion_level: SuspicionLevel,
}

/// Emitted when one input earns one or more achievements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementsUnlocked {
    /// Newly earned achievements.
    pub achievements: Vec<Achievement>,
}

/// Emitted once, when the session reaches an ending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnded {
    /// The verdict.
    pub ending: Ending,
    /// Debrief from the decision process, if any.
    pub analysis: Option<String>,
    /// Final suspicion.
    pub suspicion_level: SuspicionLevel,
}

/// Event type identifier for [`DialogSpoken`].
pub const DIALOG_SPOKEN_EVENT_TYPE: &str = "narrative.dialog_spoken";

/// Event type identifier for [`AchievementsUnlocked`].
pub const ACHIEVEMENTS_UNLOCKED_EVENT_TYPE: &str = "narrative.achievements_unlocked";

/// Event type identifier for [`GameEnded`].
pub const GAME_ENDED_EVENT_TYPE: &str = "narrative.game_ended";

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeEventKind {
    /// An NPC spoke.
    DialogSpoken(DialogSpoken),
    /// Achievements were earned.
    AchievementsUnlocked(AchievementsUnlocked),
    /// The session ended.
    GameEnded(GameEnded),
}

/// Narrative event envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: NarrativeEventKind,
}

impl DomainEvent for NarrativeEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            NarrativeEventKind::DialogSpoken(_) => DIALOG_SPOKEN_EVENT_TYPE,
            NarrativeEventKind::AchievementsUnlocked(_) => ACHIEVEMENTS_UNLOCKED_EVENT_TYPE,
            NarrativeEventKind::GameEnded(_) => GAME_ENDED_EVENT_TYPE,
        }
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
