//! Test speech doubles — scripted synthesizer and recording audio sink.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use standoff_core::speech::{AudioClip, AudioSink, SpeechError, SpeechSynthesizer, VoiceProfile};
use tokio::sync::watch;

/// A synthesizer that "encodes" text as its UTF-8 bytes, so sinks can tell
/// which line they are playing. Individual texts can be made to fail or to
/// take a while.
#[derive(Debug, Default)]
pub struct ScriptedSynthesizer {
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, VoiceProfile)>>,
}

impl ScriptedSynthesizer {
    /// Creates a synthesizer that succeeds immediately for every text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes synthesis of `text` fail.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failures.insert(text.into());
        self
    }

    /// Makes synthesis of `text` take `delay`.
    #[must_use]
    pub fn slow_on(mut self, text: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(text.into(), delay);
        self
    }

    /// Every `(text, voice)` synthesised, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(String, VoiceProfile)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioClip, SpeechError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_owned(), voice.clone()));
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(text) {
            return Err(SpeechError::Synthesis(format!("cannot voice {text:?}")));
        }
        Ok(AudioClip {
            data: text.as_bytes().to_vec(),
            content_type: "text/plain".to_owned(),
        })
    }
}

struct Playing<'a>(&'a AtomicUsize);

impl Drop for Playing<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An audio sink that records what it plays and how many clips overlapped.
#[derive(Debug)]
pub struct RecordingAudioSink {
    duration: Duration,
    failures: HashSet<String>,
    started: watch::Sender<Vec<String>>,
    finished: Mutex<Vec<String>>,
    playing: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl RecordingAudioSink {
    /// Creates a sink where every clip plays for `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            failures: HashSet::new(),
            started: watch::Sender::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            playing: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    /// Makes playback of `text` fail.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failures.insert(text.into());
        self
    }

    /// Texts whose playback started, in order.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.started.borrow().clone()
    }

    /// Texts whose playback ran to completion, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// Highest number of clips observed playing at once.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` clips have started playing.
    ///
    /// # Panics
    ///
    /// Never; the sender lives as long as the sink.
    pub async fn wait_for_started(&self, count: usize) {
        let mut started = self.started.subscribe();
        started.wait_for(|texts| texts.len() >= count).await.unwrap();
    }
}

#[async_trait]
impl AudioSink for RecordingAudioSink {
    async fn play(&self, clip: AudioClip) -> Result<(), SpeechError> {
        let text = String::from_utf8_lossy(&clip.data).into_owned();
        let now = self.playing.fetch_add(1, Ordering::SeqCst) + 1;
        let _playing = Playing(&self.playing);
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        self.started.send_modify(|texts| texts.push(text.clone()));

        tokio::time::sleep(self.duration).await;

        if self.failures.contains(&text) {
            return Err(SpeechError::Playback(format!("device rejected {text:?}")));
        }
        self.finished.lock().unwrap().push(text);
        Ok(())
    }
}
