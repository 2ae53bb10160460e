//! Shared test doubles and utilities for the Standoff confrontation game.

mod clock;
mod decision;
mod speech;

pub use clock::FixedClock;
pub use decision::{FailingDecisionAdapter, ScriptedDecisionAdapter};
pub use speech::{RecordingAudioSink, ScriptedSynthesizer};
