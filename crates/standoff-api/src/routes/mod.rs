//! HTTP routes.

pub mod channel;
pub mod health;
pub mod session;
pub mod speech;
