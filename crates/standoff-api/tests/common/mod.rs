//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use standoff_core::decision::DecisionAdapter;
use standoff_session::application::command_handlers::{handle_connection_change, handle_start_game};
use standoff_session::application::settings::SessionSettings;
use standoff_session::domain::commands::StartGame;
use standoff_test_support::FixedClock;
use tower::ServiceExt;
use uuid::Uuid;

use standoff_api::build_router;
use standoff_api::state::AppState;

/// Build the full app router around `adapter` with a fixed clock. Uses the
/// same route structure as `main.rs`.
pub fn build_test_app(adapter: Arc<dyn DecisionAdapter>) -> (Router, AppState) {
    let state = AppState::new(
        Arc::new(FixedClock::standard()),
        adapter,
        SessionSettings::default(),
    );
    (build_router(state.clone()), state)
}

/// Start a session directly through the handlers, optionally marking it
/// connected.
pub async fn start_session(state: &AppState, connected: bool) -> Uuid {
    let outcome = handle_start_game(
        &StartGame {
            correlation_id: Uuid::new_v4(),
        },
        state.clock.as_ref(),
        &state.store,
        &state.settings,
    )
    .await
    .unwrap();
    if connected {
        handle_connection_change(outcome.session_id, true, &state.store)
            .await
            .unwrap();
    }
    outcome.session_id
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
