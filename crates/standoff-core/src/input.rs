//! Player input events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionReading, EmotionSample};
use crate::error::GameError;

/// One content-bearing input from the media-capture collaborator: an emotion
/// sample, a transcribed utterance, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Classified emotion over the capture window.
    #[serde(default)]
    pub emotion: Option<EmotionSample>,
    /// Transcribed speech.
    #[serde(default)]
    pub speech_text: Option<String>,
    /// When the input was captured.
    pub timestamp: DateTime<Utc>,
}

impl PlayerInput {
    /// Whether the input carries anything for the decision process to react to.
    #[must_use]
    pub fn is_content_bearing(&self) -> bool {
        self.emotion.is_some() || self.spoken_text().is_some()
    }

    /// The trimmed speech text, if any was captured.
    #[must_use]
    pub fn spoken_text(&self) -> Option<&str> {
        self.speech_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Summary of the emotion sample, if one with any signal was captured.
    #[must_use]
    pub fn emotion_reading(&self) -> Option<EmotionReading> {
        self.emotion.as_ref().and_then(|sample| sample.reading().ok())
    }

    /// Checks that the input can be submitted.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if the emotion sample is all zeros,
    /// or if the input has neither an emotion sample nor non-blank speech.
    pub fn validate(&self) -> Result<(), GameError> {
        if let Some(sample) = &self.emotion {
            sample.normalized()?;
        }
        if self.is_content_bearing() {
            Ok(())
        } else {
            Err(GameError::Validation(
                "input must carry an emotion sample or speech text".to_owned(),
            ))
        }
    }
}
