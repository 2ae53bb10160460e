//! HTTP client for the decision service.
//!
//! The service receives the session context and the player's input and
//! answers with a `Decision` as JSON. Deadlines are enforced by the session
//! handlers, not here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use standoff_core::decision::{Decision, DecisionAdapter, DecisionContext, DecisionError};
use standoff_core::emotion::EmotionReading;
use standoff_core::input::PlayerInput;
use tracing::debug;

use crate::error::AppError;

#[derive(Serialize)]
struct DecisionRequest<'a> {
    context: &'a DecisionContext,
    input: &'a PlayerInput,
    emotion: Option<EmotionReading>,
}

/// `DecisionAdapter` that POSTs to a remote decision service.
#[derive(Debug, Clone)]
pub struct HttpDecisionAdapter {
    client: Client,
    endpoint: String,
}

impl HttpDecisionAdapter {
    /// Creates an adapter for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("decision client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl DecisionAdapter for HttpDecisionAdapter {
    async fn decide(
        &self,
        context: &DecisionContext,
        input: &PlayerInput,
    ) -> Result<Decision, DecisionError> {
        debug!(session_id = %context.session_id, endpoint = %self.endpoint, "requesting decision");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DecisionRequest {
                context,
                input,
                emotion: input.emotion_reading(),
            })
            .send()
            .await
            .map_err(|e| DecisionError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DecisionError::Unavailable(format!(
                "decision service answered {status}"
            )));
        }

        response
            .json::<Decision>()
            .await
            .map_err(|e| DecisionError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::Utc;
    use standoff_core::scenario::Stage;
    use standoff_core::suspicion::SuspicionLevel;
    use uuid::Uuid;

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/decide")
    }

    fn context() -> DecisionContext {
        DecisionContext {
            session_id: Uuid::new_v4(),
            generation: 1,
            stage: Stage::Initial,
            suspicion_level: SuspicionLevel::new(0),
            history: Vec::new(),
            achievements_unlocked: Vec::new(),
            achievement_candidates: Vec::new(),
            npcs: Vec::new(),
        }
    }

    fn input() -> PlayerInput {
        PlayerInput {
            emotion: None,
            speech_text: Some("Evening.".into()),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_decide_posts_context_and_decodes_decision() {
        // Arrange
        let app = Router::new().route(
            "/decide",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["input"]["speech_text"], "Evening.");
                assert_eq!(body["context"]["stage"], "initial");
                Json(serde_json::json!({
                    "next_stage": "escalating",
                    "suspicion_delta": 2,
                    "dialogs": [{"speaker_id": "thug", "text": "Is it?"}]
                }))
            }),
        );
        let adapter = HttpDecisionAdapter::new(serve(app).await).unwrap();

        // Act
        let decision = adapter.decide(&context(), &input()).await.unwrap();

        // Assert
        assert_eq!(decision.next_stage, Stage::Escalating);
        assert_eq!(decision.suspicion_delta, 2);
        assert_eq!(decision.dialogs[0].text, "Is it?");
    }

    #[tokio::test]
    async fn test_decide_sends_emotion_reading() {
        // Arrange
        let app = Router::new().route(
            "/decide",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["emotion"]["dominant"], "fear");
                assert_eq!(body["emotion"]["volatility"], "moderate");
                assert_eq!(body["emotion"]["scores"]["fear"], 75.0);
                Json(serde_json::json!({ "suspicion_delta": 1 }))
            }),
        );
        let adapter = HttpDecisionAdapter::new(serve(app).await).unwrap();
        let nervous = PlayerInput {
            emotion: Some(
                serde_json::from_value(serde_json::json!({
                    "fear": 6.0, "neutral": 2.0, "stability": 60.0
                }))
                .unwrap(),
            ),
            ..input()
        };

        // Act
        let decision = adapter.decide(&context(), &nervous).await.unwrap();

        // Assert
        assert_eq!(decision.suspicion_delta, 1);
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let app = Router::new().route(
            "/decide",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let adapter = HttpDecisionAdapter::new(serve(app).await).unwrap();

        let result = adapter.decide(&context(), &input()).await;

        assert!(matches!(result, Err(DecisionError::Unavailable(message)) if message.contains("503")));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let app = Router::new().route("/decide", post(|| async { "not json" }));
        let adapter = HttpDecisionAdapter::new(serve(app).await).unwrap();

        let result = adapter.decide(&context(), &input()).await;

        assert!(matches!(result, Err(DecisionError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let adapter = HttpDecisionAdapter::new(format!("http://{addr}/decide")).unwrap();

        let result = adapter.decide(&context(), &input()).await;

        assert!(matches!(result, Err(DecisionError::Unavailable(_))));
    }
}
