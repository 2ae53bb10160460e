//! Domain layer: the session aggregate, its commands and narrative events.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod scenario;
