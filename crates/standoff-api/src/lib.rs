//! Standoff — API server library.
//!
//! Hosts the realtime channel (`GET /ws`), the session HTTP API, the speech
//! synthesis proxy and the HTTP clients for the decision and text-to-speech
//! services. The binary in `main.rs` adds configuration, telemetry and the
//! HTTP middleware stack.

use axum::Router;

pub mod channel;
pub mod config;
pub mod decision;
pub mod error;
pub mod routes;
pub mod speech;
pub mod state;
pub mod telemetry;

use state::AppState;

/// Builds the application router without middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::channel::router())
        .nest("/api/v1/sessions", routes::session::router())
        .nest("/api/v1/speech", routes::speech::router())
        .with_state(state)
}
