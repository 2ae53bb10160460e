//! Emotion samples supplied by the media-capture collaborator.
//!
//! The classifier itself lives outside this workspace. Samples reach the
//! decision process alongside an `EmotionReading`: the dominant emotion,
//! the volatility band and the scores rescaled to sum to 100.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Basic emotions reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Anger.
    Angry,
    /// Disgust.
    Disgust,
    /// Fear.
    Fear,
    /// Happiness.
    Happy,
    /// Sadness.
    Sad,
    /// Surprise.
    Surprise,
    /// No dominant expression.
    Neutral,
}

/// How consistent the player's expression was over the sample window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    /// Steady expression.
    Stable,
    /// Some drift.
    Moderate,
    /// Rapidly changing expression.
    Volatile,
}

/// A sample summarised for the decision process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub dominant: Emotion,
    pub volatility: Volatility,
    /// The seven scores rescaled to sum to 100.
    pub scores: EmotionSample,
}

fn full_stability() -> f64 {
    100.0
}

/// One classified emotion sample. Values are on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    #[serde(default)]
    pub angry: f64,
    #[serde(default)]
    pub disgust: f64,
    #[serde(default)]
    pub fear: f64,
    #[serde(default)]
    pub happy: f64,
    #[serde(default)]
    pub sad: f64,
    #[serde(default)]
    pub surprise: f64,
    #[serde(default)]
    pub neutral: f64,
    /// How stable the expression was across frames.
    #[serde(default = "full_stability")]
    pub stability: f64,
    /// How often the dominant expression changed.
    #[serde(default)]
    pub transition_score: f64,
}

impl EmotionSample {
    fn scores(&self) -> [(Emotion, f64); 7] {
        [
            (Emotion::Angry, self.angry),
            (Emotion::Disgust, self.disgust),
            (Emotion::Fear, self.fear),
            (Emotion::Happy, self.happy),
            (Emotion::Sad, self.sad),
            (Emotion::Surprise, self.surprise),
            (Emotion::Neutral, self.neutral),
        ]
    }

    /// The most prominent emotion. Ties resolve to the first in declaration order.
    #[must_use]
    pub fn dominant(&self) -> Emotion {
        self.scores()
            .into_iter()
            .fold((Emotion::Neutral, f64::MIN), |best, (emotion, score)| {
                if score > best.1 { (emotion, score) } else { best }
            })
            .0
    }

    /// Summarises stability and transition metrics.
    #[must_use]
    pub fn volatility(&self) -> Volatility {
        if self.stability >= 80.0 && self.transition_score <= 20.0 {
            Volatility::Stable
        } else if self.stability <= 40.0 || self.transition_score >= 60.0 {
            Volatility::Volatile
        } else {
            Volatility::Moderate
        }
    }

    /// Rescales the seven emotions so they sum to 100, rounded to one decimal.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if every emotion is zero.
    pub fn normalized(&self) -> Result<Self, GameError> {
        let total: f64 = self.scores().iter().map(|(_, score)| score).sum();
        if total <= 0.0 {
            return Err(GameError::Validation(
                "emotion sample has no signal".to_owned(),
            ));
        }
        let scale = |value: f64| (value / total * 1000.0).round() / 10.0;
        Ok(Self {
            angry: scale(self.angry),
            disgust: scale(self.disgust),
            fear: scale(self.fear),
            happy: scale(self.happy),
            sad: scale(self.sad),
            surprise: scale(self.surprise),
            neutral: scale(self.neutral),
            ..self.clone()
        })
    }

    /// Summarises the sample.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Validation` if every emotion is zero.
    pub fn reading(&self) -> Result<EmotionReading, GameError> {
        let scores = self.normalized()?;
        Ok(EmotionReading {
            dominant: scores.dominant(),
            volatility: scores.volatility(),
            scores,
        })
    }
}
