//! Client Event Sequencer: routes each server message to the UI and, for
//! dialog, to the audio queue.
//!
//! Messages are handled strictly in receipt order. The UI is updated as
//! soon as a message arrives; it never waits for audio. Messages that
//! belong to an older session generation (a session the player already
//! restarted away from) are dropped, as are narrative frames repeating a
//! sequence number already seen. Gaps in the sequence are logged.

use futures::{Stream, StreamExt};
use standoff_protocol::ServerMessage;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audio::AudioQueue;

/// The view layer. Called synchronously for every accepted message.
pub trait UiSink: Send {
    /// Shows `message`.
    fn render(&mut self, message: &ServerMessage);
}

/// What happened to a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// Shown (and voiced, for dialog).
    Accepted,
    /// Dropped because it belongs to an older generation or a session the
    /// client has left, or repeats a frame already handled.
    Stale,
}

/// Sequences server messages for one client.
pub struct EventSequencer<U> {
    ui: U,
    audio: AudioQueue,
    session_id: Option<Uuid>,
    generation: Option<u64>,
    last_sequence: Option<u64>,
    ended: bool,
    received: u64,
    discarded: u64,
}

impl<U: UiSink> EventSequencer<U> {
    #[must_use]
    pub fn new(ui: U, audio: AudioQueue) -> Self {
        Self {
            ui,
            audio,
            session_id: None,
            generation: None,
            last_sequence: None,
            ended: false,
            received: 0,
            discarded: 0,
        }
    }

    /// Handles one message.
    pub fn receive(&mut self, message: ServerMessage) -> Receipt {
        self.received += 1;

        if let Some(generation) = message.generation() {
            match self.generation {
                Some(current) if generation < current => {
                    self.discarded += 1;
                    debug!(generation, current, receipt = self.received, "dropping stale message");
                    return Receipt::Stale;
                }
                Some(current) if generation > current => {
                    debug!(generation, previous = current, "new session generation");
                    self.audio.stop_and_clear();
                    self.adopt(generation);
                }
                None => self.adopt(generation),
                Some(_) => {}
            }
        }

        if self.names_left_session(&message) {
            self.discarded += 1;
            debug!(receipt = self.received, "dropping reply for a session already left");
            return Receipt::Stale;
        }

        if let Some(sequence) = message.sequence() {
            match self.last_sequence {
                Some(last) if sequence <= last => {
                    self.discarded += 1;
                    warn!(sequence, last, "dropping repeated narrative frame");
                    return Receipt::Stale;
                }
                Some(last) if sequence > last + 1 => {
                    warn!(sequence, last, missing = sequence - last - 1, "gap in narrative sequence");
                }
                _ => {}
            }
            self.last_sequence = Some(sequence);
        }

        self.ui.render(&message);

        match &message {
            ServerMessage::SessionStarted { session_id, .. } => {
                self.session_id = Some(*session_id);
            }
            ServerMessage::Resumed {
                resumed, game_over, ..
            } => {
                self.session_id = Some(*resumed);
                self.ended = *game_over;
            }
            ServerMessage::Dialog { dialog, npc_id, .. } => {
                if self.ended {
                    debug!(npc_id = %npc_id, "session over; showing line without voicing it");
                } else {
                    self.audio.enqueue(dialog.clone(), npc_id.clone());
                }
            }
            ServerMessage::GameOver { .. } => self.ended = true,
            ServerMessage::Achievement { .. }
            | ServerMessage::Error { .. }
            | ServerMessage::Recording { .. } => {}
        }
        Receipt::Accepted
    }

    /// Error and recording frames carry no generation; they are stale when
    /// they name a session other than the current one.
    fn names_left_session(&self, message: &ServerMessage) -> bool {
        let named = match message {
            ServerMessage::Error { session_id, .. } => *session_id,
            ServerMessage::Recording { session_id, .. } => Some(*session_id),
            _ => None,
        };
        matches!((named, self.session_id), (Some(named), Some(current)) if named != current)
    }

    fn adopt(&mut self, generation: u64) {
        self.generation = Some(generation);
        self.last_sequence = None;
        self.ended = false;
    }

    /// Handles every message from `stream` until it ends.
    pub async fn run<S>(&mut self, stream: S)
    where
        S: Stream<Item = ServerMessage>,
    {
        futures::pin_mut!(stream);
        while let Some(message) = stream.next().await {
            self.receive(message);
        }
        debug!(received = self.received, discarded = self.discarded, "message stream ended");
    }

    /// The audio queue, e.g. to forward user gestures.
    #[must_use]
    pub fn audio(&self) -> &AudioQueue {
        &self.audio
    }

    #[must_use]
    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Session the client is currently in.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Generation of that session.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Messages received so far, including dropped ones.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Messages dropped as stale.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use standoff_core::error::GameError;
    use standoff_core::scenario::Ending;
    use standoff_core::speech::{AudioSink, SpeechSynthesizer};
    use standoff_core::suspicion::SuspicionLevel;
    use standoff_test_support::{RecordingAudioSink, ScriptedSynthesizer};

    use super::*;
    use crate::voice::VoiceMap;

    #[derive(Default)]
    struct RecordingUi {
        shown: Vec<ServerMessage>,
    }

    impl UiSink for RecordingUi {
        fn render(&mut self, message: &ServerMessage) {
            self.shown.push(message.clone());
        }
    }

    fn sequencer(sink: &Arc<RecordingAudioSink>) -> EventSequencer<RecordingUi> {
        let audio = AudioQueue::spawn(
            Arc::new(ScriptedSynthesizer::new()) as Arc<dyn SpeechSynthesizer>,
            Arc::clone(sink) as Arc<dyn AudioSink>,
            VoiceMap::default(),
        );
        EventSequencer::new(RecordingUi::default(), audio)
    }

    fn started(generation: u64) -> ServerMessage {
        ServerMessage::SessionStarted {
            session_id: Uuid::new_v4(),
            generation,
        }
    }

    fn dialog(text: &str, generation: u64, sequence: u64) -> ServerMessage {
        ServerMessage::Dialog {
            dialog: text.into(),
            npc_id: "thug".into(),
            suspicion_level: SuspicionLevel::new(2),
            generation,
            sequence,
        }
    }

    fn game_over(generation: u64, sequence: u64) -> ServerMessage {
        ServerMessage::GameOver {
            game_over: true,
            ending_type: Ending::Failure,
            analysis: Some("You pushed too hard.".into()),
            suspicion_level: SuspicionLevel::new(10),
            generation,
            sequence,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ui_is_updated_without_waiting_for_audio() {
        // Arrange
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_secs(30)));
        let mut sequencer = sequencer(&sink);
        sequencer.audio().gesture_received();

        // Act
        sequencer.receive(started(1));
        for (n, line) in ["One.", "Two.", "Three."].into_iter().enumerate() {
            sequencer.receive(dialog(line, 1, n as u64 + 1));
        }

        // Assert
        assert_eq!(sequencer.ui().shown.len(), 4);
        sequencer.audio().settled().await;
        assert_eq!(sink.finished(), ["One.", "Two.", "Three."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_discarded() {
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_millis(10)));
        let mut sequencer = sequencer(&sink);
        sequencer.audio().gesture_received();

        sequencer.receive(started(2));
        let receipt = sequencer.receive(dialog("From the old session.", 1, 5));
        sequencer.audio().settled().await;

        assert_eq!(receipt, Receipt::Stale);
        assert_eq!(sequencer.ui().shown.len(), 1);
        assert_eq!(sequencer.received(), 2);
        assert_eq!(sequencer.discarded(), 1);
        assert!(sink.started().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_generation_flushes_audio() {
        // Arrange
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_secs(5)));
        let mut sequencer = sequencer(&sink);
        sequencer.receive(started(1));
        sequencer.receive(dialog("Old one.", 1, 1));
        sequencer.receive(dialog("Old two.", 1, 2));

        // Act
        let restarted = started(4);
        sequencer.receive(restarted.clone());
        sequencer.receive(dialog("Fresh start.", 4, 1));
        sequencer.audio().gesture_received();
        sequencer.audio().settled().await;

        // Assert
        assert_eq!(sequencer.generation(), Some(4));
        let ServerMessage::SessionStarted { session_id, .. } = restarted else {
            unreachable!()
        };
        assert_eq!(sequencer.session_id(), Some(session_id));
        assert_eq!(sink.finished(), ["Fresh start."]);
        assert_eq!(sequencer.audio().status().discarded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dialog_after_game_over_is_shown_but_not_voiced() {
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_millis(100)));
        let mut sequencer = sequencer(&sink);
        sequencer.audio().gesture_received();

        sequencer.receive(started(1));
        sequencer.receive(dialog("Last warning.", 1, 1));
        sequencer.receive(game_over(1, 2));
        sequencer.receive(dialog("Should stay silent.", 1, 3));
        sequencer.audio().settled().await;

        assert_eq!(sequencer.ui().shown.len(), 4);
        assert_eq!(sink.finished(), ["Last warning."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_consumes_stream_in_order() {
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_millis(100)));
        let mut sequencer = sequencer(&sink);
        sequencer.audio().gesture_received();
        let messages = vec![
            started(1),
            dialog("A.", 1, 1),
            ServerMessage::Achievement {
                achievement_unlocked: Vec::new(),
                generation: 1,
                sequence: 2,
            },
            dialog("B.", 1, 3),
        ];

        sequencer.run(futures::stream::iter(messages.clone())).await;
        sequencer.audio().settled().await;

        assert_eq!(sequencer.ui().shown, messages);
        assert_eq!(sink.finished(), ["A.", "B."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_for_left_session_is_discarded() {
        // Arrange
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_millis(10)));
        let mut sequencer = sequencer(&sink);
        let old = started(1);
        let ServerMessage::SessionStarted { session_id: old_id, .. } = old else {
            unreachable!()
        };
        sequencer.receive(old);
        sequencer.receive(started(2));
        let late = ServerMessage::from_error(&GameError::InvalidTransition {
            session_id: old_id,
            reason: "session was replaced or ended".into(),
        });
        let current = ServerMessage::from_error(&GameError::TransportDisconnected(
            sequencer.session_id().unwrap(),
        ));

        // Act
        let late_receipt = sequencer.receive(late);
        let current_receipt = sequencer.receive(current);

        // Assert
        assert_eq!(late_receipt, Receipt::Stale);
        assert_eq!(current_receipt, Receipt::Accepted);
        assert_eq!(sequencer.ui().shown.len(), 3);
        assert_eq!(sequencer.discarded(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_sequence_is_dropped_and_gap_is_tolerated() {
        // Arrange
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_millis(10)));
        let mut sequencer = sequencer(&sink);
        sequencer.audio().gesture_received();
        sequencer.receive(started(3));
        sequencer.receive(dialog("First.", 3, 1));

        // Act
        let repeated = sequencer.receive(dialog("First.", 3, 1));
        let after_gap = sequencer.receive(dialog("Fourth.", 3, 4));
        sequencer.audio().settled().await;

        // Assert
        assert_eq!(repeated, Receipt::Stale);
        assert_eq!(after_gap, Receipt::Accepted);
        assert_eq!(sequencer.discarded(), 1);
        assert_eq!(sink.finished(), ["First.", "Fourth."]);
    }
}
