//! Aggregate root for the game session context.
//!
//! `GameSession` is the session state machine. Transitions that come from
//! the decision process are pure: [`GameSession::apply_decision`] takes an
//! immutable snapshot and returns the next snapshot plus the events it
//! produced, leaving the receiver untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use standoff_core::clock::Clock;
use standoff_core::decision::{Decision, DecisionContext};
use standoff_core::error::GameError;
use standoff_core::event::EventMetadata;
use standoff_core::input::PlayerInput;
use standoff_core::scenario::{Achievement, Ending, Npc, PLAYER_SPEAKER_ID, Stage, Turn};
use standoff_core::suspicion::SuspicionLevel;
use uuid::Uuid;

use super::events::{
    AchievementsUnlocked, DialogSpoken, GameEnded, NarrativeEvent, NarrativeEventKind,
};
use super::scenario::ScenarioScript;

/// Whether a client is currently attached to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No client attached; the session waits for a reconnect.
    Disconnected,
    /// A client is attached and receives events.
    Connected,
}

/// Lifecycle of the player's current recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RecordingState {
    /// Not recording.
    Idle,
    /// A recording is in progress.
    Recording {
        /// Identifier of the recording.
        recording_id: String,
        /// When it started.
        started_at: DateTime<Utc>,
    },
}

/// The result of a state machine step.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The next session snapshot.
    pub session: GameSession,
    /// Events produced by the step, in delivery order.
    pub events: Vec<NarrativeEvent>,
}

/// The aggregate root for one confrontation.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: Uuid,
    generation: u64,
    version: u64,
    stage: Stage,
    suspicion: SuspicionLevel,
    history: Vec<Turn>,
    ending: Option<Ending>,
    analysis: Option<String>,
    achievements: Vec<Achievement>,
    npcs: Vec<Npc>,
    connection: ConnectionState,
    recording: RecordingState,
    recordings_taken: u32,
    next_sequence: u64,
    created_at: DateTime<Utc>,
}

impl GameSession {
    /// Starts a session: the opening NPC delivers the script's first line.
    #[must_use]
    pub fn begin(
        id: Uuid,
        generation: u64,
        script: &ScenarioScript,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Transition {
        let now = clock.now();
        let mut session = Self {
            id,
            generation,
            version: 0,
            stage: Stage::Initial,
            suspicion: script.initial_suspicion,
            history: Vec::new(),
            ending: None,
            analysis: None,
            achievements: Vec::new(),
            npcs: vec![script.opening_speaker.clone()],
            connection: ConnectionState::Disconnected,
            recording: RecordingState::Idle,
            recordings_taken: 0,
            next_sequence: 1,
            created_at: now,
        };
        let mut events = Vec::new();
        session.speak(
            &script.opening_speaker.id,
            &script.opening_line,
            correlation_id,
            now,
            &mut events,
        );
        Transition { session, events }
    }

    /// Applies the decision process's answer to `input`.
    ///
    /// Suspicion moves by the decision's delta exactly once and is clamped
    /// into range. The decision's ending is authoritative; without one,
    /// reaching maximum suspicion ends the session in failure.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if the session has already
    /// ended.
    pub fn apply_decision(
        &self,
        input: &PlayerInput,
        decision: Decision,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Transition, GameError> {
        self.ensure_accepts_input()?;

        let now = clock.now();
        let mut next = self.clone();
        let mut events = Vec::new();

        if let Some(text) = input.spoken_text() {
            next.history.push(Turn {
                speaker_id: PLAYER_SPEAKER_ID.to_owned(),
                text: text.to_owned(),
                suspicion_level: self.suspicion,
                occurred_at: input.timestamp,
            });
        }

        next.suspicion = self.suspicion.apply_delta(decision.suspicion_delta);
        // Only an ending may conclude the session.
        next.stage = self
            .stage
            .advance_to(decision.next_stage.min(Stage::Resolving));

        if let Some(npc) = decision.new_npc {
            if !next.npcs.iter().any(|known| known.id == npc.id) {
                next.npcs.push(npc);
            }
        }

        for line in decision.dialogs {
            next.speak(&line.speaker_id, &line.text, correlation_id, now, &mut events);
        }

        let mut unlocked = Vec::new();
        for achievement in decision.achievements {
            if !next.has_achievement(&achievement.name) {
                next.achievements.push(achievement.clone());
                unlocked.push(achievement);
            }
        }
        if !unlocked.is_empty() {
            next.emit(
                NarrativeEventKind::AchievementsUnlocked(AchievementsUnlocked {
                    achievements: unlocked,
                }),
                correlation_id,
                now,
                &mut events,
            );
        }

        let ending = decision
            .ending
            .or_else(|| next.suspicion.is_max().then_some(Ending::Failure));
        if let Some(ending) = ending {
            next.ending = Some(ending);
            next.stage = Stage::Concluded;
            next.analysis.clone_from(&decision.analysis);
            next.emit(
                NarrativeEventKind::GameEnded(GameEnded {
                    ending,
                    analysis: decision.analysis,
                    suspicion_level: next.suspicion,
                }),
                correlation_id,
                now,
                &mut events,
            );
        }

        next.version += 1;
        Ok(Transition {
            session: next,
            events,
        })
    }

    /// Builds the context handed to the decision process.
    #[must_use]
    pub fn decision_context(&self, script: &ScenarioScript) -> DecisionContext {
        DecisionContext {
            session_id: self.id,
            generation: self.generation,
            stage: self.stage,
            suspicion_level: self.suspicion,
            history: self.history.clone(),
            achievements_unlocked: self.achievements.iter().map(|a| a.name.clone()).collect(),
            achievement_candidates: script
                .achievements
                .iter()
                .filter(|criteria| !self.has_achievement(&criteria.name))
                .cloned()
                .collect(),
            npcs: self.npcs.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if the session has ended.
    pub fn ensure_accepts_input(&self) -> Result<(), GameError> {
        match self.ending {
            Some(_) => Err(GameError::InvalidTransition {
                session_id: self.id,
                reason: "session has already ended".to_owned(),
            }),
            None => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns `GameError::TransportDisconnected` if no client is attached.
    pub fn ensure_connected(&self) -> Result<(), GameError> {
        match self.connection {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Disconnected => Err(GameError::TransportDisconnected(self.id)),
        }
    }

    /// Marks a client as attached.
    pub fn attach_connection(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    /// Marks the client as gone. The session itself lives on.
    pub fn detach_connection(&mut self) {
        self.connection = ConnectionState::Disconnected;
    }

    /// Starts a new recording and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if the session has ended or a
    /// recording is already in progress.
    pub fn start_recording(&mut self, clock: &dyn Clock) -> Result<String, GameError> {
        self.ensure_accepts_input()?;
        if matches!(self.recording, RecordingState::Recording { .. }) {
            return Err(GameError::InvalidTransition {
                session_id: self.id,
                reason: "a recording is already in progress".to_owned(),
            });
        }
        self.recordings_taken += 1;
        let recording_id = format!("recording_{}_{}", self.id, self.recordings_taken);
        self.recording = RecordingState::Recording {
            recording_id: recording_id.clone(),
            started_at: clock.now(),
        };
        Ok(recording_id)
    }

    /// Stops the current recording and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if nothing is being recorded.
    pub fn stop_recording(&mut self) -> Result<String, GameError> {
        match std::mem::replace(&mut self.recording, RecordingState::Idle) {
            RecordingState::Recording { recording_id, .. } => Ok(recording_id),
            RecordingState::Idle => Err(GameError::InvalidTransition {
                session_id: self.id,
                reason: "no recording in progress".to_owned(),
            }),
        }
    }

    fn has_achievement(&self, name: &str) -> bool {
        self.achievements.iter().any(|a| a.name == name)
    }

    fn speak(
        &mut self,
        speaker_id: &str,
        text: &str,
        correlation_id: Uuid,
        now: DateTime<Utc>,
        events: &mut Vec<NarrativeEvent>,
    ) {
        self.history.push(Turn {
            speaker_id: speaker_id.to_owned(),
            text: text.to_owned(),
            suspicion_level: self.suspicion,
            occurred_at: now,
        });
        self.emit(
            NarrativeEventKind::DialogSpoken(DialogSpoken {
                speaker_id: speaker_id.to_owned(),
                text: text.to_owned(),
                suspicion_level: self.suspicion,
            }),
            correlation_id,
            now,
            events,
        );
    }

    fn emit(
        &mut self,
        kind: NarrativeEventKind,
        correlation_id: Uuid,
        now: DateTime<Utc>,
        events: &mut Vec<NarrativeEvent>,
    ) {
        events.push(NarrativeEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                session_id: self.id,
                generation: self.generation,
                sequence_number: self.next_sequence,
                correlation_id,
                occurred_at: now,
            },
            kind,
        });
        self.next_sequence += 1;
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Generation tag of this session instance.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of decisions applied.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn suspicion(&self) -> SuspicionLevel {
        self.suspicion
    }

    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    #[must_use]
    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    #[must_use]
    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    #[must_use]
    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    #[must_use]
    pub fn recording(&self) -> &RecordingState {
        &self.recording
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether an ending has been reached.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.ending.is_some()
    }

    /// Number of lines the player has spoken.
    #[must_use]
    pub fn dialog_exchanges(&self) -> usize {
        self.history
            .iter()
            .filter(|turn| turn.speaker_id == PLAYER_SPEAKER_ID)
            .count()
    }
}
