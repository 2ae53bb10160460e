//! HTTP client for the text-to-speech service.
//!
//! The service takes `{text, voice, audio_encoding}` as JSON and answers with
//! the encoded audio, typed by its `Content-Type`. Vendor credentials stay
//! with the service; this server only forwards.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use standoff_core::speech::{AudioClip, SpeechError, SpeechSynthesizer, VoiceProfile};
use tracing::debug;

use crate::error::AppError;

/// Content type assumed when the service does not name one.
pub const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    voice: &'a VoiceProfile,
    audio_encoding: &'static str,
}

/// `SpeechSynthesizer` that POSTs to a remote text-to-speech service.
#[derive(Debug, Clone)]
pub struct HttpTtsClient {
    client: Client,
    endpoint: String,
}

impl HttpTtsClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("speech client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpTtsClient {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioClip, SpeechError> {
        debug!(voice = %voice.name, chars = text.len(), "requesting synthesis");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TtsRequest {
                text,
                voice,
                audio_encoding: "MP3",
            })
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Synthesis(format!(
                "speech service answered {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_AUDIO_TYPE)
            .to_owned();
        let data = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;
        if data.is_empty() {
            return Err(SpeechError::Synthesis(
                "speech service returned no audio".to_owned(),
            ));
        }

        Ok(AudioClip {
            data: data.to_vec(),
            content_type,
        })
    }
}
