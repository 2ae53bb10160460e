//! Scenario vocabulary: stages, endings, turns, achievements and NPCs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::suspicion::SuspicionLevel;

/// Speaker id used for lines spoken by the player.
pub const PLAYER_SPEAKER_ID: &str = "player";

/// Narrative phase of a confrontation.
///
/// Variants are declared in narrative order; the derived ordering is what
/// keeps a session from ever moving backwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The NPC has just stopped the player.
    #[default]
    Initial,
    /// Tension is building.
    Escalating,
    /// The confrontation is winding down one way or another.
    Resolving,
    /// The session has ended.
    Concluded,
}

impl Stage {
    /// Returns the later of `self` and `proposed`.
    #[must_use]
    pub fn advance_to(self, proposed: Stage) -> Stage {
        self.max(proposed)
    }
}

/// Terminal outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// The player talked their way out.
    Success,
    /// The confrontation turned against the player.
    Failure,
}

/// One line of the session history. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke: an NPC id or [`PLAYER_SPEAKER_ID`].
    pub speaker_id: String,
    /// What was said.
    pub text: String,
    /// Suspicion at the time the line was recorded.
    pub suspicion_level: SuspicionLevel,
    /// When the line was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// An achievement shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Display name; unique within a session.
    pub name: String,
    /// What the player did to earn it.
    pub description: String,
}

/// An achievement the decision process may award, with its criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementCriteria {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description shown when unlocked.
    pub description: String,
    /// What the player must do.
    pub criteria: String,
}

impl AchievementCriteria {
    /// The achievement shown once these criteria are met.
    #[must_use]
    pub fn achievement(&self) -> Achievement {
        Achievement {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// A non-player character taking part in the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Speaker id used in dialog lines.
    pub id: String,
    /// Physical description.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_to_never_regresses() {
        assert_eq!(Stage::Resolving.advance_to(Stage::Initial), Stage::Resolving);
        assert_eq!(Stage::Initial.advance_to(Stage::Escalating), Stage::Escalating);
    }

    #[test]
    fn test_stage_and_ending_use_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&Stage::Escalating).unwrap(), "\"escalating\"");
        assert_eq!(serde_json::to_string(&Ending::Failure).unwrap(), "\"failure\"");
    }
}
