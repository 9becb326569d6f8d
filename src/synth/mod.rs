//! Speech synthesis: provider seam, live streams and stream collection.

pub mod collector;
pub mod elevenlabs;
pub mod stream;

pub use collector::{Termination, collect, terminate};
pub use elevenlabs::ElevenLabsSynthesizer;
pub use stream::{Attempt, EventStream, ResponseStream, StreamEvent, SynthesisStream, WrappedStream};

use crate::config::SynthesisConfig;
use crate::defaults;
use crate::error::{Result, ToneTwistError};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Complete synthesized audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResult {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl AudioResult {
    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: defaults::AUDIO_CONTENT_TYPE,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Voice tuning sent with every synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: defaults::SYNTHESIS_STABILITY,
            similarity_boost: defaults::SYNTHESIS_SIMILARITY_BOOST,
        }
    }
}

/// One synthesis call, minus the credential.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub settings: VoiceSettings,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>, config: &SynthesisConfig) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            model_id: config.model_id.clone(),
            settings: VoiceSettings {
                stability: config.stability,
                similarity_boost: config.similarity_boost,
            },
        }
    }
}

/// Opens live synthesis streams.
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Start synthesis and return the audio as a live stream.
    ///
    /// The caller owns the stream and must drain or terminate it.
    async fn open_stream(
        &self,
        request: &SynthesisRequest,
        api_key: &str,
    ) -> Result<Box<dyn SynthesisStream>>;

    /// Name of the synthesis backend
    fn name(&self) -> &str;
}

/// Stream shape produced by [`MockSynthesizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockShape {
    #[default]
    Chunks,
    Events,
    Wrapped,
    /// A stream that never yields or ends
    Stalled,
}

/// Mock synthesizer for testing
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    chunks: Vec<Bytes>,
    shape: MockShape,
    failure: Option<(u16, String)>,
    requests: Mutex<Vec<SynthesisRequest>>,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            chunks: vec![Bytes::from_static(b"mock-audio")],
            ..Self::default()
        }
    }

    /// Configure the chunks the stream yields, in order
    pub fn with_chunks<I, B>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shape(mut self, shape: MockShape) -> Self {
        self.shape = shape;
        self
    }

    /// Configure the mock to reject the request with an upstream status
    pub fn with_failure(mut self, status: u16, message: &str) -> Self {
        self.failure = Some((status, message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Synthesizer for MockSynthesizer {
    async fn open_stream(
        &self,
        request: &SynthesisRequest,
        _api_key: &str,
    ) -> Result<Box<dyn SynthesisStream>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some((status, message)) = &self.failure {
            return Err(ToneTwistError::Upstream {
                provider: "ElevenLabs",
                status: *status,
                message: message.clone(),
            });
        }

        let source = futures_util::stream::iter(
            self.chunks
                .clone()
                .into_iter()
                .map(Ok::<Bytes, std::io::Error>),
        );
        let stream: Box<dyn SynthesisStream> = match self.shape {
            MockShape::Chunks => Box::new(ResponseStream::new(source)),
            MockShape::Events => Box::new(EventStream::spawn(source)),
            MockShape::Wrapped => Box::new(WrappedStream::new(Box::new(EventStream::spawn(source)))),
            MockShape::Stalled => Box::new(ResponseStream::new(futures_util::stream::pending())),
        };
        Ok(stream)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn request_uses_configured_voice_settings() {
        let request = SynthesisRequest::new("Ahoy", "voice-1", &SynthesisConfig::default());

        assert_eq!(request.model_id, "eleven_multilingual_v2");
        assert_eq!(request.settings, VoiceSettings::default());
        assert_eq!(request.settings.stability, 0.5);
        assert_eq!(request.settings.similarity_boost, 0.75);
    }

    #[test]
    fn audio_result_is_mpeg() {
        let audio = AudioResult::mpeg(vec![1, 2, 3]);
        assert_eq!(audio.content_type, "audio/mpeg");
        assert_eq!(audio.len(), 3);
        assert!(!audio.is_empty());
    }

    #[tokio::test]
    async fn mock_synthesizer_streams_configured_chunks_in_every_shape() {
        for shape in [MockShape::Chunks, MockShape::Events, MockShape::Wrapped] {
            let synthesizer = MockSynthesizer::new()
                .with_chunks([&b"one"[..], &b"two"[..]])
                .with_shape(shape);
            let request = SynthesisRequest::new("hi", "v", &SynthesisConfig::default());

            let mut stream = synthesizer.open_stream(&request, "key").await.unwrap();
            let buffer = collect(stream.as_mut(), Duration::from_secs(5)).await.unwrap();

            assert_eq!(buffer, b"onetwo", "shape {shape:?}");
            assert_eq!(synthesizer.requests(), vec![request]);
        }
    }

    #[tokio::test]
    async fn mock_synthesizer_failure_is_upstream_error() {
        let synthesizer = MockSynthesizer::new().with_failure(401, "bad key");
        let request = SynthesisRequest::new("hi", "v", &SynthesisConfig::default());

        let err = synthesizer.open_stream(&request, "key").await.err().unwrap();

        assert_eq!(err.status(), 401);
        assert_eq!(synthesizer.calls(), 1);
    }
}
