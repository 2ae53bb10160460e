//! Integration tests for the session API.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use standoff_core::decision::{Decision, DialogLine};
use standoff_core::scenario::{Ending, Stage};
use standoff_protocol::ServerMessage;
use standoff_test_support::ScriptedDecisionAdapter;
use tokio::sync::mpsc;
use uuid::Uuid;

fn line(text: &str) -> DialogLine {
    DialogLine {
        speaker_id: "thug".into(),
        text: text.into(),
    }
}

#[tokio::test]
async fn test_list_sessions_in_start_order() {
    let (app, state) = common::build_test_app(Arc::new(ScriptedDecisionAdapter::new()));
    let first = common::start_session(&state, false).await;
    let second = common::start_session(&state, true).await;

    let (status, json) = common::get_json(app, "/api/v1/sessions").await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["session_id"], first.to_string());
    assert_eq!(rows[1]["session_id"], second.to_string());
    assert_eq!(rows[1]["connected"], true);
    assert_eq!(rows[0]["game_over"], false);
}

#[tokio::test]
async fn test_input_round_trip_publishes_to_linked_connection() {
    // Arrange
    let adapter = Arc::new(ScriptedDecisionAdapter::new().then_decide(Decision {
        dialogs: vec![line("You lost, friend?")],
        ..Decision::new(Stage::Escalating, 3)
    }));
    let (app, state) = common::build_test_app(adapter.clone());
    let session_id = common::start_session(&state, true).await;
    let (outbound, mut frames) = mpsc::unbounded_channel();
    state.hub.link(session_id, Uuid::new_v4(), outbound).await;

    // Act
    let (status, json) = common::post_json(
        app.clone(),
        &format!("/api/v1/sessions/{session_id}/inputs"),
        &serde_json::json!({
            "speech_text": "Just passing through.",
            "emotion": { "neutral": 82.0, "fear": 9.5, "stability": 91.0 }
        }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["events_published"], 1);
    assert_eq!(json["game_over"], false);
    assert!(matches!(
        frames.try_recv().unwrap(),
        ServerMessage::Dialog { ref dialog, .. } if dialog == "You lost, friend?"
    ));

    let (status, view) = common::get_json(app, &format!("/api/v1/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["stage"], "escalating");
    assert_eq!(view["suspicion_level"], 3);
    assert_eq!(view["version"], 1);
    assert_eq!(adapter.inputs()[0].speech_text.as_deref(), Some("Just passing through."));
}

#[tokio::test]
async fn test_ending_input_reports_game_over_and_locks_session() {
    // Arrange
    let adapter = Arc::new(ScriptedDecisionAdapter::new().then_decide(Decision {
        dialogs: vec![line("Fine. Get lost.")],
        ending: Some(Ending::Success),
        analysis: Some("Stayed calm throughout.".into()),
        ..Decision::new(Stage::Resolving, -1)
    }));
    let (app, state) = common::build_test_app(adapter.clone());
    let session_id = common::start_session(&state, true).await;
    let uri = format!("/api/v1/sessions/{session_id}/inputs");

    // Act
    let (status, json) = common::post_json(
        app.clone(),
        &uri,
        &serde_json::json!({ "speech_text": "I'm leaving." }),
    )
    .await;
    let (again, error) =
        common::post_json(app, &uri, &serde_json::json!({ "speech_text": "Wait." })).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["game_over"], true);
    assert_eq!(again, StatusCode::CONFLICT);
    assert_eq!(error["error"], "invalid_transition");
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn test_input_for_disconnected_session_returns_409() {
    let (app, state) = common::build_test_app(Arc::new(ScriptedDecisionAdapter::new()));
    let session_id = common::start_session(&state, false).await;

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/inputs"),
        &serde_json::json!({ "speech_text": "Anyone?" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "transport_disconnected");
}

#[tokio::test]
async fn test_input_for_unknown_session_returns_404() {
    let (app, _state) = common::build_test_app(Arc::new(ScriptedDecisionAdapter::new()));

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{}/inputs", Uuid::new_v4()),
        &serde_json::json!({ "speech_text": "Hello?" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "unknown_session");
}

#[tokio::test]
async fn test_delete_session_removes_it() {
    let (app, state) = common::build_test_app(Arc::new(ScriptedDecisionAdapter::new()));
    let session_id = common::start_session(&state, true).await;
    let uri = format!("/api/v1/sessions/{session_id}");

    let (status, _) = common::delete(app.clone(), &uri).await;
    let (after, _) = common::get_json(app, &uri).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(after, StatusCode::NOT_FOUND);
    assert!(state.store.is_empty().await);
}
