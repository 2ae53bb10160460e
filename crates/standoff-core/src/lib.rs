//! Standoff Core — shared domain primitives and collaborator ports.
//!
//! This crate defines the vocabulary every other Standoff crate speaks:
//! the bounded suspicion metric, scenario stages and endings, player input,
//! and the traits behind which the decision process and speech synthesis
//! live. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod decision;
pub mod emotion;
pub mod error;
pub mod event;
pub mod input;
pub mod scenario;
pub mod speech;
pub mod suspicion;
