//! Realtime Channel Server.
//!
//! A [`connection::Connection`] turns client frames into session actions.
//! The [`hub::SessionHub`] runs one worker per session so that actions on a
//! session are applied one at a time in arrival order, and routes the
//! resulting events to whichever connection the session is linked to.
//! [`socket`] bridges an axum WebSocket onto a `Connection`.

pub mod connection;
pub mod hub;
pub mod messages;
pub mod socket;
mod worker;
