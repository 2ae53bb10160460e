//! The scripted parts of a confrontation: who opens, what they say, and
//! which achievements can be earned.

use standoff_core::scenario::{AchievementCriteria, Npc};
use standoff_core::suspicion::SuspicionLevel;

/// Fixed setup of every new session.
#[derive(Debug, Clone)]
pub struct ScenarioScript {
    /// The NPC who starts the confrontation.
    pub opening_speaker: Npc,
    /// Their first line, sent right after the session id.
    pub opening_line: String,
    /// Suspicion of a fresh session.
    pub initial_suspicion: SuspicionLevel,
    /// Achievements the decision process may award.
    pub achievements: Vec<AchievementCriteria>,
}

fn criteria(id: &str, name: &str, description: &str, criteria: &str) -> AchievementCriteria {
    AchievementCriteria {
        id: id.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        criteria: criteria.to_owned(),
    }
}

impl Default for ScenarioScript {
    fn default() -> Self {
        Self {
            opening_speaker: Npc {
                id: "thug".to_owned(),
                description: "A broad-shouldered man in a torn leather jacket, blocking the alley"
                    .to_owned(),
            },
            opening_line: "Hey, you. Yeah, you. What do you think you're doing in my alley?"
                .to_owned(),
            initial_suspicion: SuspicionLevel::new(0),
            achievements: vec![
                criteria(
                    "smart_ass",
                    "Smart Ass",
                    "You're a smart ass",
                    "Acting smart ass",
                ),
                criteria(
                    "not_afraid",
                    "Not Afraid",
                    "You're not afraid",
                    "Asking for a fight instead of running away",
                ),
                criteria(
                    "silver_tongue",
                    "Silver Tongue",
                    "Talk your way out of danger",
                    "Convince the thug to leave without confrontation",
                ),
                criteria(
                    "brave_heart",
                    "Brave Heart",
                    "Show no fear in the face of danger",
                    "Maintain confident emotions throughout encounter",
                ),
            ],
        }
    }
}
