//! Stage orchestration: transcribe → enhance → synthesize.

use crate::audio::{AudioNormalizer, AudioPayload, FfmpegNormalizer};
use crate::config::{Config, LimitsConfig, SynthesisConfig};
use crate::error::{Stage, StageError, ToneTwistError};
use crate::persona::{PersonaProfile, require_persona};
use crate::rewrite::{OpenRouterRewriter, StyleRewriter};
use crate::stt::{GoogleSpeechTranscriber, Transcriber};
use crate::synth::{AudioResult, ElevenLabsSynthesizer, SynthesisRequest, Synthesizer, collect};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result type of every boundary operation.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Settings the pipeline needs beyond its stage implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub limits: LimitsConfig,
    /// Synthesis parameters and credential slots
    pub synthesis: SynthesisConfig,
    /// Deadline for draining one synthesis stream
    pub stream_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            limits: config.limits.clone(),
            synthesis: config.synthesis.clone(),
            stream_timeout: Duration::from_secs(config.synthesis.stream_timeout_secs),
        }
    }
}

/// Everything produced by a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub transcript: String,
    pub styled_text: String,
    pub audio: AudioResult,
}

/// The three-stage voice restyling pipeline.
///
/// Stateless between calls: every operation may run concurrently with any
/// other on the same instance.
#[derive(Clone)]
pub struct Pipeline {
    normalizer: Arc<dyn AudioNormalizer>,
    transcriber: Arc<dyn Transcriber>,
    rewriter: Arc<dyn StyleRewriter>,
    synthesizer: Arc<dyn Synthesizer>,
    config: Arc<PipelineConfig>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("normalizer", &self.normalizer.name())
            .field("transcriber", &self.transcriber.name())
            .field("rewriter", &self.rewriter.name())
            .field("synthesizer", &self.synthesizer.name())
            .finish()
    }
}

impl Pipeline {
    pub fn new(
        normalizer: Arc<dyn AudioNormalizer>,
        transcriber: Arc<dyn Transcriber>,
        rewriter: Arc<dyn StyleRewriter>,
        synthesizer: Arc<dyn Synthesizer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            normalizer,
            transcriber,
            rewriter,
            synthesizer,
            config: Arc::new(config),
        }
    }

    /// Wire the production providers from configuration.
    ///
    /// One HTTP client (and connection pool) is shared by all providers.
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::new();
        Self::new(
            Arc::new(FfmpegNormalizer::from_config(&config.transcoder)),
            Arc::new(
                GoogleSpeechTranscriber::with_client(client.clone(), &config.transcription)
                    .with_max_duration_secs(config.limits.max_duration_secs),
            ),
            Arc::new(OpenRouterRewriter::with_client(client.clone(), &config.rewrite)),
            Arc::new(ElevenLabsSynthesizer::with_client(client, &config.synthesis)),
            PipelineConfig::from(config),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Audio in, transcript out. An empty transcript is not an error.
    pub async fn transcribe(&self, payload: &AudioPayload) -> StageResult<String> {
        let started = Instant::now();
        tracing::info!(
            filename = payload.filename(),
            bytes = payload.size(),
            "Transcription started"
        );

        let text = self
            .run_transcription(payload)
            .await
            .map_err(|e| stage_failed(Stage::Transcription, e))?;

        tracing::info!(
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transcription finished"
        );
        Ok(text)
    }

    async fn run_transcription(&self, payload: &AudioPayload) -> crate::error::Result<String> {
        let limits = &self.config.limits;
        payload.validate(limits)?;

        let audio = self.normalizer.normalize(payload).await?;

        // Containers that do not declare their length are checked here,
        // before the recognizer is called.
        if let Some(duration) = audio.duration()
            && duration.as_secs_f64() > limits.max_duration_secs as f64
        {
            return Err(ToneTwistError::DurationExceeded {
                max_secs: limits.max_duration_secs,
            });
        }

        let transcript = self.transcriber.transcribe(&audio).await?;
        Ok(transcript.text())
    }

    /// Rewrite `text` in the style of persona `style`.
    pub async fn enhance(&self, text: &str, style: &str) -> StageResult<String> {
        let started = Instant::now();
        let result = async {
            if text.trim().is_empty() || style.trim().is_empty() {
                return Err(ToneTwistError::validation(
                    "Missing text or style in request body.",
                ));
            }
            let persona = require_persona(style)?;
            tracing::info!(persona = persona.key, chars = text.len(), "Enhancement started");
            self.rewriter.rewrite(text, persona).await
        }
        .await
        .map_err(|e| stage_failed(Stage::Enhancement, e))?;

        tracing::info!(
            chars = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enhancement finished"
        );
        Ok(result)
    }

    /// Speak `text` in persona `style`'s voice.
    pub async fn synthesize(&self, text: &str, style: &str) -> StageResult<AudioResult> {
        let started = Instant::now();
        let audio = async {
            if text.trim().is_empty() {
                return Err(ToneTwistError::validation(
                    "Missing or invalid text in request body.",
                ));
            }
            let persona = require_persona(style)?;
            self.run_synthesis(text, persona).await
        }
        .await
        .map_err(|e| stage_failed(Stage::Synthesis, e))?;

        tracing::info!(
            bytes = audio.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesis finished"
        );
        Ok(audio)
    }

    async fn run_synthesis(
        &self,
        text: &str,
        persona: &PersonaProfile,
    ) -> crate::error::Result<AudioResult> {
        let synthesis = &self.config.synthesis;
        let slot = persona.credential_slot;
        let api_key = synthesis.api_key_for_slot(slot).ok_or_else(|| {
            tracing::error!(persona = persona.key, slot, "No synthesis API key for credential slot");
            ToneTwistError::Config {
                message: "API Key for the selected voice style is missing.".to_string(),
            }
        })?;

        tracing::info!(
            persona = persona.key,
            voice_id = persona.voice_id,
            slot,
            "Synthesis started"
        );

        let request = SynthesisRequest::new(text, persona.voice_id, synthesis);
        let mut stream = self.synthesizer.open_stream(&request, api_key).await?;
        let bytes = collect(stream.as_mut(), self.config.stream_timeout).await?;

        Ok(AudioResult::mpeg(bytes))
    }

    /// Full pipeline. The persona is checked before any stage runs, and the
    /// first failing stage aborts the rest.
    pub async fn run(&self, payload: &AudioPayload, style: &str) -> StageResult<RunOutput> {
        require_persona(style).map_err(|e| stage_failed(Stage::Enhancement, e))?;

        let transcript = self.transcribe(payload).await?;
        if transcript.trim().is_empty() {
            return Err(stage_failed(
                Stage::Enhancement,
                ToneTwistError::validation("No speech was recognized in the audio."),
            ));
        }

        let styled_text = self.enhance(&transcript, style).await?;
        let audio = self.synthesize(&styled_text, style).await?;

        Ok(RunOutput {
            transcript,
            styled_text,
            audio,
        })
    }
}

fn stage_failed(stage: Stage, error: ToneTwistError) -> StageError {
    let error = StageError::new(stage, error);
    tracing::error!(
        stage = stage.label(),
        status = error.status(),
        error = %error.error,
        "Stage failed"
    );
    error
}
