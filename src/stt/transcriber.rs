use crate::audio::NormalizedAudio;
use crate::error::{Result, ToneTwistError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One recognized utterance: the top alternative of an upstream result.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub confidence: Option<f32>,
}

/// Ordered recognition output. Empty when no speech was recognized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }

    /// Segment texts joined with newlines.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for Transcript {
    fn from(text: &str) -> Self {
        Self {
            segments: text
                .lines()
                .map(|line| TranscriptSegment {
                    text: line.to_string(),
                    confidence: None,
                })
                .collect(),
        }
    }
}

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (remote recognizer vs mock).
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe normalized (mono, 16 kHz, FLAC) audio.
    ///
    /// An empty recognition result is `Ok` with an empty transcript.
    async fn transcribe(&self, audio: &NormalizedAudio) -> Result<Transcript>;

    /// Name of the recognition backend
    fn name(&self) -> &str;
}

/// Implement Transcriber for Arc<T> to allow sharing across requests.
#[async_trait::async_trait]
impl<T: Transcriber> Transcriber for Arc<T> {
    async fn transcribe(&self, audio: &NormalizedAudio) -> Result<Transcript> {
        (**self).transcribe(audio).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Default)]
pub struct MockTranscriber {
    response: String,
    failure: Option<MockFailure>,
    calls: AtomicUsize,
}

#[derive(Debug, Clone, Copy)]
enum MockFailure {
    Upstream,
    TooLong,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new() -> Self {
        Self {
            response: "mock transcription".to_string(),
            ..Self::default()
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail with an upstream error
    pub fn with_failure(mut self) -> Self {
        self.failure = Some(MockFailure::Upstream);
        self
    }

    /// Configure the mock to reject the clip as too long
    pub fn with_duration_failure(mut self) -> Self {
        self.failure = Some(MockFailure::TooLong);
        self
    }

    /// Number of times `transcribe` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio: &NormalizedAudio) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(MockFailure::Upstream) => Err(ToneTwistError::Upstream {
                provider: "Google Speech",
                status: 500,
                message: "mock transcription failure".to_string(),
            }),
            Some(MockFailure::TooLong) => Err(ToneTwistError::DurationExceeded {
                max_secs: crate::defaults::MAX_DURATION_SECS,
            }),
            None => Ok(Transcript::from(self.response.as_str())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
