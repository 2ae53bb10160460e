//! Standoff — client runtime.
//!
//! Consumes the server's message stream, keeps the UI in step with it, and
//! voices NPC dialog one line at a time once the player has interacted with
//! the page. Lines are synthesised through the server's speech route.

pub mod audio;
pub mod sequencer;
pub mod speech;
pub mod voice;

pub use audio::{AudioQueue, PlaybackState, QueueStatus};
pub use sequencer::{EventSequencer, Receipt, UiSink};
pub use speech::HttpSpeechSynthesizer;
pub use voice::VoiceMap;
