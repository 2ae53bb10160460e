//! Audio Playback Queue: voices dialog lines one at a time, in order.
//!
//! A single worker task owns the queue. Lines are held until the first user
//! gesture (browsers refuse to start audio before one) and then played
//! strictly first-in, first-out: a line is synthesised only once the
//! previous line has finished playing, so at most one clip is ever audible.
//!
//! Failures are per line. A line that cannot be synthesised or played is
//! logged and skipped; the queue carries on with the next one.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use standoff_core::speech::{AudioSink, SpeechSynthesizer};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::voice::VoiceMap;

/// Whether a line is being voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Synthesising or playing a line.
    Playing,
}

/// Observable state of the queue. Counters are cumulative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub state: PlaybackState,
    /// Lines waiting to be voiced.
    pub pending: usize,
    /// Whether a user gesture has been seen.
    pub unlocked: bool,
    /// Lines received by the worker.
    pub accepted: u64,
    /// Lines played to completion.
    pub played: u64,
    /// Lines skipped after a synthesis or playback failure.
    pub failed: u64,
    /// Lines dropped by a stop.
    pub discarded: u64,
}

impl QueueStatus {
    fn accounted(&self) -> u64 {
        self.played + self.failed + self.discarded
    }
}

#[derive(Debug)]
struct QueueItem {
    text: String,
    speaker_id: String,
}

#[derive(Debug)]
enum QueueCommand {
    Enqueue(QueueItem),
    Gesture,
    StopAndClear,
}

enum Flow {
    Continue,
    Stopped,
    Closed,
}

/// Handle to the playback worker. Dropping it shuts the worker down and
/// halts whatever is playing.
#[derive(Debug)]
pub struct AudioQueue {
    commands: mpsc::UnboundedSender<QueueCommand>,
    status: watch::Receiver<QueueStatus>,
    enqueued: AtomicU64,
}

impl AudioQueue {
    /// Starts the playback worker on the current tokio runtime.
    #[must_use]
    pub fn spawn(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        voices: VoiceMap,
    ) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(QueueStatus::default());
        let worker = Worker {
            inbox,
            pending: VecDeque::new(),
            unlocked: false,
            status: status_tx,
            synthesizer,
            sink,
            voices,
        };
        tokio::spawn(worker.run());
        Self {
            commands,
            status,
            enqueued: AtomicU64::new(0),
        }
    }

    /// Appends a line to the back of the queue.
    pub fn enqueue(&self, text: impl Into<String>, speaker_id: impl Into<String>) {
        let item = QueueItem {
            text: text.into(),
            speaker_id: speaker_id.into(),
        };
        self.enqueued.fetch_add(1, Ordering::SeqCst);
        if self.commands.send(QueueCommand::Enqueue(item)).is_err() {
            self.enqueued.fetch_sub(1, Ordering::SeqCst);
            warn!("audio queue worker has stopped; line dropped");
        }
    }

    /// Records a user gesture. The first one releases held lines in order;
    /// later ones are no-ops.
    pub fn gesture_received(&self) {
        self.send(QueueCommand::Gesture);
    }

    /// Halts the current line, drops every pending one and returns to idle.
    ///
    /// A synthesis already under way is left to finish, but its audio is
    /// never played.
    pub fn stop_and_clear(&self) {
        self.send(QueueCommand::StopAndClear);
    }

    fn send(&self, command: QueueCommand) {
        if self.commands.send(command).is_err() {
            debug!("audio queue worker has stopped");
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        self.status.borrow().clone()
    }

    /// Waits until every line enqueued so far has been played, skipped or
    /// discarded and the queue is idle.
    ///
    /// Lines held for a gesture are not settled, so this never returns
    /// while the queue is still locked with lines pending.
    pub async fn settled(&self) {
        let target = self.enqueued.load(Ordering::SeqCst);
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|s| {
                s.accepted >= target && s.accounted() >= target && s.state == PlaybackState::Idle
            })
            .await;
        if settled.is_err() {
            debug!("audio queue worker stopped before settling");
        }
    }
}

struct Worker {
    inbox: mpsc::UnboundedReceiver<QueueCommand>,
    pending: VecDeque<QueueItem>,
    unlocked: bool,
    status: watch::Sender<QueueStatus>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    voices: VoiceMap,
}

impl Worker {
    async fn run(mut self) {
        while let Some(command) = self.inbox.recv().await {
            self.accept(command, false);
            while self.unlocked {
                let Some(item) = self.pending.pop_front() else {
                    break;
                };
                self.publish(PlaybackState::Playing);
                if let Flow::Closed = self.voice(item).await {
                    debug!("audio queue closed during playback");
                    return;
                }
            }
            self.publish(PlaybackState::Idle);
        }
        debug!("audio queue closed");
    }

    fn accept(&mut self, command: QueueCommand, busy: bool) -> Flow {
        match command {
            QueueCommand::Enqueue(item) => {
                self.pending.push_back(item);
                let pending = self.pending.len();
                self.status.send_modify(|s| {
                    s.accepted += 1;
                    s.pending = pending;
                });
                Flow::Continue
            }
            QueueCommand::Gesture => {
                if !self.unlocked {
                    debug!(pending = self.pending.len(), "audio unlocked by user gesture");
                    self.unlocked = true;
                    self.status.send_modify(|s| s.unlocked = true);
                }
                Flow::Continue
            }
            QueueCommand::StopAndClear => {
                let dropped = self.pending.len() + usize::from(busy);
                self.pending.clear();
                debug!(dropped, "audio stopped and cleared");
                self.status.send_modify(|s| {
                    s.discarded += dropped as u64;
                    s.pending = 0;
                });
                Flow::Stopped
            }
        }
    }

    fn while_busy(&mut self, command: Option<QueueCommand>) -> Flow {
        match command {
            Some(command) => self.accept(command, true),
            None => Flow::Closed,
        }
    }

    async fn voice(&mut self, item: QueueItem) -> Flow {
        let voice = self.voices.resolve(&item.speaker_id).clone();
        let synthesizer = Arc::clone(&self.synthesizer);
        let text = item.text.clone();
        // Spawned so that a stop abandons the result without cancelling the
        // request itself.
        let mut synthesis =
            tokio::spawn(async move { synthesizer.synthesize(&text, &voice).await });

        let synthesized = loop {
            tokio::select! {
                result = &mut synthesis => break result,
                command = self.inbox.recv() => match self.while_busy(command) {
                    Flow::Continue => {}
                    flow => return flow,
                },
            }
        };
        let clip = match synthesized {
            Ok(Ok(clip)) => clip,
            Ok(Err(e)) => {
                warn!(speaker_id = %item.speaker_id, error = %e, "skipping line that could not be synthesised");
                self.status.send_modify(|s| s.failed += 1);
                return Flow::Continue;
            }
            Err(e) => {
                warn!(speaker_id = %item.speaker_id, error = %e, "synthesis task failed");
                self.status.send_modify(|s| s.failed += 1);
                return Flow::Continue;
            }
        };

        let sink = Arc::clone(&self.sink);
        let mut playback = sink.play(clip);
        let played = loop {
            tokio::select! {
                result = &mut playback => break result,
                command = self.inbox.recv() => match self.while_busy(command) {
                    Flow::Continue => {}
                    // Returning drops `playback`, which halts the clip.
                    flow => return flow,
                },
            }
        };
        match played {
            Ok(()) => self.status.send_modify(|s| s.played += 1),
            Err(e) => {
                warn!(speaker_id = %item.speaker_id, error = %e, "skipping line that could not be played");
                self.status.send_modify(|s| s.failed += 1);
            }
        }
        Flow::Continue
    }

    fn publish(&self, state: PlaybackState) {
        let pending = self.pending.len();
        let unlocked = self.unlocked;
        self.status.send_modify(|s| {
            s.state = state;
            s.pending = pending;
            s.unlocked = unlocked;
        });
    }
}
