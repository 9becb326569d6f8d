//! Speech-to-text: the recognizer seam and its Google Speech backend.

pub mod google;
pub mod transcriber;

pub use google::GoogleSpeechTranscriber;
pub use transcriber::{MockTranscriber, Transcriber, Transcript, TranscriptSegment};
