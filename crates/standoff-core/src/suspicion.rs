//! The bounded suspicion metric.

use serde::{Deserialize, Serialize};

/// How close the confrontation is to turning violent, on a 0–10 scale.
///
/// Every constructor and update clamps into range; out-of-range values are
/// never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct SuspicionLevel(u8);

impl SuspicionLevel {
    /// Lowest possible level.
    pub const MIN: u8 = 0;
    /// Highest possible level. Reaching it ends the game unless the decision
    /// process already chose an ending.
    pub const MAX: u8 = 10;

    /// Creates a level, clamping `value` into `[MIN, MAX]`.
    // Clamped into 0..=10 before narrowing, so the cast cannot truncate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(clamped as u8)
    }

    /// Returns the raw value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns `clamp(self + delta, MIN, MAX)`.
    #[must_use]
    pub fn apply_delta(self, delta: i32) -> Self {
        Self::new(i64::from(self.0) + i64::from(delta))
    }

    /// Whether the level sits at the hard boundary.
    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 == Self::MAX
    }
}

impl From<i64> for SuspicionLevel {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<SuspicionLevel> for u8 {
    fn from(level: SuspicionLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for SuspicionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
