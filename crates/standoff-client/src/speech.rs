//! Speech synthesis through the game server's synthesis route.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use standoff_core::speech::{AudioClip, SpeechError, SpeechSynthesizer, VoiceProfile};
use tracing::debug;

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a VoiceProfile,
}

/// `SpeechSynthesizer` backed by the server's `POST /api/v1/speech`.
#[derive(Debug, Clone)]
pub struct HttpSpeechSynthesizer {
    client: Client,
    endpoint: String,
}

impl HttpSpeechSynthesizer {
    /// Creates a synthesizer posting to `endpoint`, the full URL of the
    /// synthesis route.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Synthesis` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SpeechError::Synthesis(format!("speech client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioClip, SpeechError> {
        debug!(endpoint = %self.endpoint, voice = %voice.name, "synthesising line");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthesisRequest { text, voice })
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Synthesis(format!(
                "synthesis route answered {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_owned();
        let data = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;

        Ok(AudioClip {
            data: data.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::{StatusCode, header};
    use axum::routing::post;
    use axum::{Json, Router};
    use standoff_core::speech::AudioSink;
    use standoff_test_support::RecordingAudioSink;

    use super::*;
    use crate::audio::AudioQueue;
    use crate::voice::VoiceMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/v1/speech")
    }

    /// Echoes the requested text back as the audio payload.
    fn echo_route() -> Router {
        Router::new().route(
            "/api/v1/speech",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert!(body["voice"]["language_code"].is_string());
                let text = body["text"].as_str().unwrap_or_default().to_owned();
                ([(header::CONTENT_TYPE, "audio/mpeg")], text.into_bytes())
            }),
        )
    }

    fn voice() -> VoiceProfile {
        VoiceProfile {
            language_code: "en-US".into(),
            name: "en-US-Standard-D".into(),
        }
    }

    #[tokio::test]
    async fn test_synthesize_posts_text_and_voice() {
        // Arrange
        let synthesizer = HttpSpeechSynthesizer::new(serve(echo_route()).await).unwrap();

        // Act
        let clip = synthesizer.synthesize("Hey, you.", &voice()).await.unwrap();

        // Assert
        assert_eq!(clip.data, b"Hey, you.");
        assert_eq!(clip.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_route_error_is_a_synthesis_failure() {
        let app = Router::new().route(
            "/api/v1/speech",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let synthesizer = HttpSpeechSynthesizer::new(serve(app).await).unwrap();

        let result = synthesizer.synthesize("Hey, you.", &voice()).await;

        assert!(matches!(result, Err(SpeechError::Synthesis(message)) if message.contains("503")));
    }

    #[tokio::test]
    async fn test_audio_queue_plays_lines_synthesised_over_http() {
        // Arrange
        let synthesizer = HttpSpeechSynthesizer::new(serve(echo_route()).await).unwrap();
        let sink = Arc::new(RecordingAudioSink::new(Duration::from_millis(5)));
        let queue = AudioQueue::spawn(
            Arc::new(synthesizer) as Arc<dyn SpeechSynthesizer>,
            Arc::clone(&sink) as Arc<dyn AudioSink>,
            VoiceMap::default(),
        );

        // Act
        queue.gesture_received();
        queue.enqueue("First line.", "thug");
        queue.enqueue("Second line.", "thug");
        queue.settled().await;

        // Assert
        assert_eq!(sink.finished(), ["First line.", "Second line."]);
    }
}
