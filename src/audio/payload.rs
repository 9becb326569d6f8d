//! Uploaded or recorded audio as received at the pipeline boundary.

use crate::audio::{media, wav};
use crate::config::LimitsConfig;
use crate::defaults;
use crate::error::{Result, ToneTwistError};
use std::path::Path;

/// Raw audio bytes plus what the caller declared about them.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    bytes: Vec<u8>,
    filename: String,
    content_type: Option<String>,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: None,
        }
    }

    /// Attach the declared MIME type (e.g., from a multipart field).
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.content_type = (!content_type.trim().is_empty()).then_some(content_type);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Container tag used as the scratch file extension.
    ///
    /// Taken from the filename extension, then the MIME type, falling back to
    /// webm (what browsers record). Always short lowercase ASCII alphanumerics.
    pub fn container(&self) -> String {
        let from_name = Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| is_safe_extension(ext));

        from_name
            .or_else(|| self.content_type.as_deref().and_then(container_for_mime))
            .unwrap_or_else(|| defaults::FALLBACK_CONTAINER.to_string())
    }

    /// Enforce the upload limits before any transcoding happens.
    ///
    /// Duration is checked here only when the container header declares it;
    /// everything else is re-checked on the normalized output.
    pub fn validate(&self, limits: &LimitsConfig) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(ToneTwistError::validation("No audio file provided."));
        }

        if self.bytes.len() > limits.max_upload_bytes {
            return Err(ToneTwistError::validation(format!(
                "Audio file is too large ({} bytes). Maximum size is {} MB.",
                self.bytes.len(),
                limits.max_upload_bytes / (1024 * 1024)
            )));
        }

        let container = self.container();
        if container != "wav" {
            return self.check_declared_duration(&container, limits);
        }

        match wav::read_header(&self.bytes) {
            Ok(info) if info.duration().as_secs_f64() > limits.max_duration_secs as f64 => {
                return Err(ToneTwistError::DurationExceeded {
                    max_secs: limits.max_duration_secs,
                });
            }
            Ok(info) => {
                tracing::debug!(
                    duration_ms = info.duration().as_millis() as u64,
                    sample_rate = info.sample_rate,
                    channels = info.channels,
                    "WAV upload within limits"
                );
            }
            Err(e) => {
                // Left to the transcoder, which gives the definitive answer.
                tracing::debug!(error = %e, "Could not read WAV header");
            }
        }

        Ok(())
    }

    /// Length check for containers other than WAV, when the header records one.
    fn check_declared_duration(&self, container: &str, limits: &LimitsConfig) -> Result<()> {
        match media::inspect(&self.bytes, Some(container)) {
            Ok(info) => match info.duration {
                Some(duration) if duration.as_secs_f64() > limits.max_duration_secs as f64 => {
                    Err(ToneTwistError::DurationExceeded {
                        max_secs: limits.max_duration_secs,
                    })
                }
                duration => {
                    tracing::debug!(
                        container,
                        duration_ms = duration.map(|d| d.as_millis() as u64),
                        sample_rate = info.sample_rate,
                        "Upload within limits"
                    );
                    Ok(())
                }
            },
            Err(e) => {
                tracing::debug!(container, error = %e, "Could not read container header");
                Ok(())
            }
        }
    }
}

fn is_safe_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

fn container_for_mime(mime: &str) -> Option<String> {
    let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
    let container = match essence.as_str() {
        "audio/webm" | "video/webm" => "webm",
        "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/mp4" | "audio/x-m4a" | "audio/aac" => "m4a",
        "audio/flac" | "audio/x-flac" => "flac",
        _ => return None,
    };
    Some(container.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn silent_wav(seconds: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..(8000 * seconds) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn container_from_filename_extension() {
        let payload = AudioPayload::new(vec![1], "clip.MP3");
        assert_eq!(payload.container(), "mp3");
    }

    #[test]
    fn container_from_mime_when_no_extension() {
        let payload =
            AudioPayload::new(vec![1], "blob").with_content_type("audio/ogg; codecs=opus");
        assert_eq!(payload.container(), "ogg");
    }

    #[test]
    fn container_falls_back_to_webm() {
        let payload = AudioPayload::new(vec![1], "recording");
        assert_eq!(payload.container(), "webm");
    }

    #[test]
    fn container_rejects_unsafe_extension() {
        let payload = AudioPayload::new(vec![1], "x.we/../bm").with_content_type("audio/wav");
        assert_eq!(payload.container(), "wav");
    }

    #[test]
    fn blank_content_type_is_ignored() {
        let payload = AudioPayload::new(vec![1], "a.wav").with_content_type("  ");
        assert_eq!(payload.content_type(), None);
    }

    #[test]
    fn validate_rejects_empty_payload() {
        let payload = AudioPayload::new(Vec::new(), "empty.webm");
        let err = payload.validate(&LimitsConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "No audio file provided.");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn validate_rejects_oversized_payload() {
        let limits = LimitsConfig {
            max_upload_bytes: 16,
            ..LimitsConfig::default()
        };
        let payload = AudioPayload::new(vec![0u8; 17], "big.webm");
        let err = payload.validate(&limits).unwrap_err();
        assert!(matches!(err, ToneTwistError::Validation { .. }));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn validate_rejects_long_wav() {
        let limits = LimitsConfig {
            max_duration_secs: 2,
            ..LimitsConfig::default()
        };
        let payload = AudioPayload::new(silent_wav(3), "long.wav");
        let err = payload.validate(&limits).unwrap_err();
        assert!(matches!(
            err,
            ToneTwistError::DurationExceeded { max_secs: 2 }
        ));
    }

    #[test]
    fn validate_accepts_short_wav() {
        let payload = AudioPayload::new(silent_wav(1), "short.wav");
        assert!(payload.validate(&LimitsConfig::default()).is_ok());
    }

    #[test]
    fn validate_reads_declared_length_of_other_containers() {
        let limits = LimitsConfig {
            max_duration_secs: 2,
            ..LimitsConfig::default()
        };
        let long = AudioPayload::new(silent_wav(3), "clip.audio");
        let short = AudioPayload::new(silent_wav(1), "clip.audio");

        assert!(matches!(
            long.validate(&limits).unwrap_err(),
            ToneTwistError::DurationExceeded { max_secs: 2 }
        ));
        assert!(short.validate(&limits).is_ok());
    }

    #[test]
    fn validate_rejects_long_flac() {
        let available = std::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !available {
            eprintln!("ffmpeg not found on PATH, skipping FLAC length test");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("long.wav");
        let output = dir.path().join("long.flac");
        std::fs::write(&input, silent_wav(61)).unwrap();
        let status = std::process::Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(&input)
            .arg(&output)
            .status()
            .unwrap();
        assert!(status.success());

        let payload = AudioPayload::new(std::fs::read(&output).unwrap(), "long.flac");
        let err = payload.validate(&LimitsConfig::default()).unwrap_err();

        assert!(matches!(err, ToneTwistError::DurationExceeded { max_secs: 60 }));
    }

    #[test]
    fn validate_leaves_unreadable_containers_to_transcoder() {
        let payload = AudioPayload::new(b"opaque browser recording".to_vec(), "take.webm");
        assert!(payload.validate(&LimitsConfig::default()).is_ok());
    }

    #[test]
    fn validate_leaves_unparseable_wav_to_transcoder() {
        let payload = AudioPayload::new(vec![1, 2, 3, 4], "broken.wav");
        assert!(payload.validate(&LimitsConfig::default()).is_ok());
    }
}
