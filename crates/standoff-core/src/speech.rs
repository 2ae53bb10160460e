//! Speech synthesis and playback ports used by the client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A synthesis voice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// BCP-47 language code, e.g. `en-US`.
    pub language_code: String,
    /// Vendor voice name.
    pub name: String,
}

/// Synthesised audio ready to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Encoded audio bytes.
    pub data: Vec<u8>,
    /// MIME type of `data`, e.g. `audio/mpeg`.
    pub content_type: String,
}

/// Per-item speech failure. Never fatal to the playback queue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    /// Text could not be synthesised.
    #[error("synthesis failed: {0}")]
    Synthesis(String),
    /// Audio could not be played.
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Turns text into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesises `text` with `voice`.
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioClip, SpeechError>;
}

/// Plays audio to the user.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Plays `clip` and resolves once playback has finished.
    ///
    /// Dropping the returned future must halt playback.
    async fn play(&self, clip: AudioClip) -> Result<(), SpeechError>;
}
