//! Google Cloud Speech-to-Text (v1 REST, synchronous `recognize`).

use crate::audio::NormalizedAudio;
use crate::config::TranscriptionConfig;
use crate::defaults;
use crate::error::{Result, ToneTwistError};
use crate::stt::transcriber::{Transcriber, Transcript, TranscriptSegment};
use base64::Engine;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "Google Speech";
const TOO_LONG_MARKER: &str = "Sync input too long";
const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
const INVALID_ARGUMENT_CODE: i64 = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'a str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    transcript: Option<String>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    code: Option<i64>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Transcriber backed by the Google Speech REST API.
#[derive(Debug, Clone)]
pub struct GoogleSpeechTranscriber {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    model: String,
    api_key: Option<String>,
    max_duration_secs: u64,
}

impl GoogleSpeechTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Share an existing HTTP client (connection pool) with other providers.
    pub fn with_client(client: reqwest::Client, config: &TranscriptionConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_duration_secs: defaults::MAX_DURATION_SECS,
        }
    }

    /// Limit quoted in the error when the service rejects a clip as too long.
    pub fn with_max_duration_secs(mut self, secs: u64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    fn request_url(&self, api_key: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|e| ToneTwistError::Config {
            message: format!("invalid recognition endpoint '{}': {e}", self.endpoint),
        })?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    fn request_body(&self, audio: &NormalizedAudio) -> RecognizeRequest<'_> {
        RecognizeRequest {
            config: RecognitionConfig {
                encoding: defaults::RECOGNITION_ENCODING,
                sample_rate_hertz: defaults::SAMPLE_RATE,
                language_code: &self.language,
                enable_automatic_punctuation: true,
                model: &self.model,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio.bytes()),
            },
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for GoogleSpeechTranscriber {
    async fn transcribe(&self, audio: &NormalizedAudio) -> Result<Transcript> {
        let api_key = self.api_key.as_deref().ok_or_else(|| ToneTwistError::Config {
            message: "speech recognition API key is not configured (GOOGLE_SPEECH_API_KEY)"
                .to_string(),
        })?;
        let url = self.request_url(api_key)?;

        tracing::debug!(bytes = audio.bytes().len(), language = %self.language, "Sending recognize request");

        let response = self
            .client
            .post(url)
            .json(&self.request_body(audio))
            .send()
            .await
            .map_err(|e| ToneTwistError::Transport {
                provider: PROVIDER,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ToneTwistError::Transport {
            provider: PROVIDER,
            message: format!("failed to read response: {}", e.without_url()),
        })?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Recognition request failed");
            return Err(classify_error(status.as_u16(), &body, self.max_duration_secs));
        }

        let transcript = parse_recognize_response(&body)?;
        if transcript.is_empty() {
            tracing::info!("Recognizer returned no results");
        }
        Ok(transcript)
    }

    fn name(&self) -> &str {
        "google-speech"
    }
}

/// Extract the top alternative of each result, in order.
///
/// Results without alternatives (or without a transcript) are skipped. A
/// response with no results is an empty transcript.
pub fn parse_recognize_response(body: &str) -> Result<Transcript> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Transcript::default());
    }

    let response: RecognizeResponse =
        serde_json::from_str(body).map_err(|e| ToneTwistError::Upstream {
            provider: PROVIDER,
            status: 502,
            message: format!("unexpected response format: {e}"),
        })?;

    let segments = response
        .results
        .into_iter()
        .filter_map(|result| result.alternatives.into_iter().next())
        .filter_map(|alternative| {
            alternative.transcript.map(|text| TranscriptSegment {
                text,
                confidence: alternative.confidence,
            })
        })
        .collect();

    Ok(Transcript::new(segments))
}

/// Map a non-2xx recognizer response onto the error taxonomy.
fn classify_error(status: u16, body: &str, max_duration_secs: u64) -> ToneTwistError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if is_too_long(&envelope.error) => ToneTwistError::DurationExceeded {
            max_secs: max_duration_secs,
        },
        Ok(envelope) if !envelope.error.message.is_empty() => ToneTwistError::Upstream {
            provider: PROVIDER,
            status,
            message: envelope.error.message,
        },
        _ => ToneTwistError::Upstream {
            provider: PROVIDER,
            status,
            message: body.trim().to_string(),
        },
    }
}

fn is_too_long(error: &ErrorStatus) -> bool {
    let invalid_argument = error.status.as_deref() == Some(INVALID_ARGUMENT)
        || error.code == Some(INVALID_ARGUMENT_CODE);
    invalid_argument && error.message.contains(TOO_LONG_MARKER)
}
