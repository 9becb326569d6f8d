//! Audio intake: upload validation, container inspection and normalization.

pub mod media;
pub mod normalize;
pub mod payload;
pub mod wav;

pub use media::MediaInfo;
pub use normalize::{AudioNormalizer, FfmpegNormalizer, MockNormalizer, NormalizedAudio};
pub use payload::AudioPayload;
