//! The Decision Adapter port.
//!
//! The decision process (an LLM behind some service) maps the current
//! session state plus one player input to the next narrative step. It is a
//! black box with bounded latency that may fail; a failure is always an
//! explicit error, never an empty decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::input::PlayerInput;
use crate::scenario::{Achievement, AchievementCriteria, Ending, Npc, Stage, Turn};
use crate::suspicion::SuspicionLevel;

/// Session state handed to the decision process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// The session being decided.
    pub session_id: Uuid,
    /// Generation of that session instance.
    pub generation: u64,
    /// Current stage.
    pub stage: Stage,
    /// Current suspicion.
    pub suspicion_level: SuspicionLevel,
    /// Full history so far, oldest first.
    pub history: Vec<Turn>,
    /// Names of achievements already unlocked.
    pub achievements_unlocked: Vec<String>,
    /// Achievements that may still be awarded.
    pub achievement_candidates: Vec<AchievementCriteria>,
    /// NPCs present in the scene.
    pub npcs: Vec<Npc>,
}

/// A line an NPC speaks in response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogLine {
    /// Which NPC speaks.
    pub speaker_id: String,
    /// The line itself.
    pub text: String,
}

/// The decision process's answer to one input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decision {
    /// Proposed stage. Ignored if it lies before the current one.
    #[serde(default)]
    pub next_stage: Stage,
    /// Signed change to suspicion.
    #[serde(default)]
    pub suspicion_delta: i32,
    /// Lines spoken in response, in order.
    #[serde(default)]
    pub dialogs: Vec<DialogLine>,
    /// Verdict, if the scenario is over.
    #[serde(default)]
    pub ending: Option<Ending>,
    /// Debrief shown with the ending.
    #[serde(default)]
    pub analysis: Option<String>,
    /// Achievements earned by this input.
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    /// An NPC joining the scene.
    #[serde(default)]
    pub new_npc: Option<Npc>,
}

impl Decision {
    /// A decision that keeps `stage` and applies `suspicion_delta`.
    #[must_use]
    pub fn new(next_stage: Stage, suspicion_delta: i32) -> Self {
        Self {
            next_stage,
            suspicion_delta,
            ..Self::default()
        }
    }

    /// Adds a spoken line.
    #[must_use]
    pub fn with_dialog(mut self, speaker_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.dialogs.push(DialogLine {
            speaker_id: speaker_id.into(),
            text: text.into(),
        });
        self
    }

    /// Sets the verdict and debrief.
    #[must_use]
    pub fn with_ending(mut self, ending: Ending, analysis: impl Into<String>) -> Self {
        self.ending = Some(ending);
        self.analysis = Some(analysis.into());
        self
    }

    /// Adds an earned achievement.
    #[must_use]
    pub fn with_achievement(mut self, achievement: Achievement) -> Self {
        self.achievements.push(achievement);
        self
    }
}

/// Why the decision process could not produce a decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionError {
    /// The service could not be reached or answered with an error.
    #[error("decision service unavailable: {0}")]
    Unavailable(String),
    /// The service answered with something that is not a decision.
    #[error("malformed decision: {0}")]
    Malformed(String),
}

/// Maps session state plus one input to the next narrative step.
#[async_trait]
pub trait DecisionAdapter: Send + Sync {
    /// Decides the response to `input`. Called at most once per accepted input.
    async fn decide(
        &self,
        context: &DecisionContext,
        input: &PlayerInput,
    ) -> Result<Decision, DecisionError>;
}
