//! Realtime channel endpoint.

use axum::{Router, routing::get};

use crate::channel::socket::ws_handler;
use crate::state::AppState;

/// Returns the router for `GET /ws`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
