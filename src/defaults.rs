//! Default configuration constants for tonetwist.
//!
//! Shared between the config types, the provider clients and the tests so
//! the fixed pipeline parameters are defined in exactly one place.

/// Maximum accepted upload size in bytes (25 MiB).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Maximum accepted clip duration in seconds.
///
/// Synchronous recognition rejects longer input upstream as well.
pub const MAX_DURATION_SECS: u64 = 60;

/// Sample rate of normalized audio in Hz.
pub const SAMPLE_RATE: u32 = 16000;

/// Channel count of normalized audio.
pub const CHANNELS: u16 = 1;

/// Encoding tag sent to the recognizer; must match the normalizer output.
pub const RECOGNITION_ENCODING: &str = "FLAC";

/// Default ffmpeg binary, resolved through PATH.
pub const FFMPEG_BINARY: &str = "ffmpeg";

/// Container assumed for uploads that carry no usable extension.
pub const FALLBACK_CONTAINER: &str = "webm";

/// Speech recognition endpoint.
pub const RECOGNITION_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Recognition language.
pub const RECOGNITION_LANGUAGE: &str = "en-US";

/// Recognition model.
pub const RECOGNITION_MODEL: &str = "default";

/// Text generation endpoint (OpenAI-compatible chat completions).
pub const REWRITE_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Text generation model.
pub const REWRITE_MODEL: &str = "google/gemini-2.0-flash-001";

/// Sampling temperature for style rewriting.
pub const REWRITE_TEMPERATURE: f32 = 0.7;

/// Attribution URL sent to the text generation service.
pub const SITE_URL: &str = "http://localhost:3000";

/// Attribution name sent to the text generation service.
pub const SITE_NAME: &str = "ToneTwist";

/// Speech synthesis endpoint; `{voice_id}` is substituted per request.
pub const SYNTHESIS_ENDPOINT: &str = "https://api.elevenlabs.io/v1/text-to-speech/{voice_id}/stream";

/// Speech synthesis model.
pub const SYNTHESIS_MODEL: &str = "eleven_multilingual_v2";

/// Voice stability used for every persona.
pub const SYNTHESIS_STABILITY: f32 = 0.5;

/// Voice similarity boost used for every persona.
pub const SYNTHESIS_SIMILARITY_BOOST: f32 = 0.75;

/// Wall-clock budget for draining one synthesis stream, in seconds.
pub const STREAM_TIMEOUT_SECS: u64 = 90;

/// Content type of synthesized audio.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Number of synthesis credential slots.
pub const CREDENTIAL_SLOTS: u8 = 3;

/// Default bind address for `tonetwist serve`.
pub const SERVER_BIND: &str = "127.0.0.1:3000";
