//! Standoff — wire protocol of the realtime channel.
//!
//! Every frame is one JSON object. Client frames are either a control action
//! (`{"action": ...}`) or a content input; server frames are distinguished by
//! their keys, matching what the browser client already consumes.

pub mod client;
pub mod server;

pub use client::{ClientMessage, ControlAction, InputMessage, ProtocolError};
pub use server::{RecordingStatus, ServerMessage};
