//! ElevenLabs streaming text-to-speech client.

use crate::config::SynthesisConfig;
use crate::defaults;
use crate::error::{Result, ToneTwistError};
use crate::synth::stream::{ResponseStream, SynthesisStream};
use crate::synth::{SynthesisRequest, Synthesizer, VoiceSettings};
use serde::Serialize;

const PROVIDER: &str = "ElevenLabs";

#[derive(Debug, Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Synthesizer backed by the ElevenLabs streaming endpoint.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Share an existing HTTP client (connection pool) with other providers.
    pub fn with_client(client: reqwest::Client, config: &SynthesisConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }

    fn stream_url(&self, voice_id: &str) -> String {
        self.endpoint.replace("{voice_id}", voice_id)
    }
}

#[async_trait::async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn open_stream(
        &self,
        request: &SynthesisRequest,
        api_key: &str,
    ) -> Result<Box<dyn SynthesisStream>> {
        if request.text.trim().is_empty() {
            return Err(ToneTwistError::validation(
                "Missing or invalid text in request body.",
            ));
        }

        let body = TtsBody {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: request.settings,
        };

        tracing::debug!(voice_id = %request.voice_id, model = %request.model_id, "Opening synthesis stream");

        let response = self
            .client
            .post(self.stream_url(&request.voice_id))
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, defaults::AUDIO_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToneTwistError::Transport {
                provider: PROVIDER,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = match response.text().await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e.without_url(), "Could not read synthesis error body");
                    String::new()
                }
            };
            tracing::error!(status = status.as_u16(), body = %raw, "Synthesis request failed");
            return Err(ToneTwistError::Upstream {
                provider: PROVIDER,
                status: status.as_u16(),
                message: humanize_error(status.as_u16(), &error_detail(&raw)),
            });
        }

        Ok(Box::new(ResponseStream::from_response(response)))
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

/// Best-effort message out of an error body.
///
/// Handles `{"detail": {"message": ...}}`, `{"detail": "..."}` and
/// `{"message": ...}`; anything else is returned raw.
fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let detail = parsed.as_ref().and_then(|value| {
        let detail = value.get("detail").unwrap_or(value);
        detail
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| detail.as_str())
            .map(str::to_string)
    });
    detail.unwrap_or_else(|| body.trim().to_string())
}

/// Turn a provider status and message into caller-facing prose.
pub fn humanize_error(status: u16, message: &str) -> String {
    let lowered = message.to_lowercase();
    match status {
        401 => "Invalid ElevenLabs API Key provided.".to_string(),
        400 if lowered.contains("voice") => "Selected ElevenLabs voice ID not found or \
            inaccessible with the provided API key. Please verify the Voice ID in your \
            configuration."
            .to_string(),
        400 if lowered.contains("text") => "Invalid or empty text provided for synthesis.".to_string(),
        400 => {
            let details = if message.is_empty() {
                "details unavailable"
            } else {
                message
            };
            format!("Bad request ({details}). Please check input parameters.")
        }
        429 => "ElevenLabs API quota exceeded or rate limit hit for the provided key.".to_string(),
        _ if message.is_empty() => "Failed to synthesize audio.".to_string(),
        _ => message.to_string(),
    }
}
