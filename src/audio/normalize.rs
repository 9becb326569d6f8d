//! Audio normalization: any supported container → mono 16 kHz FLAC.
//!
//! Transcoding runs ffmpeg as a subprocess against two files inside a
//! per-request scratch directory. The directory is a [`tempfile::TempDir`],
//! so both files are removed when it drops, on every exit path.

use crate::audio::media;
use crate::audio::payload::AudioPayload;
use crate::config::TranscoderConfig;
use crate::defaults;
use crate::error::{Result, ToneTwistError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

/// FLAC audio guaranteed to be mono at 16 kHz.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAudio {
    bytes: Vec<u8>,
    duration: Option<Duration>,
}

impl NormalizedAudio {
    /// Wrap transcoder output, verifying the format contract.
    pub fn from_flac(bytes: Vec<u8>) -> Result<Self> {
        let info = media::inspect(&bytes, Some("flac"))?;
        if !info.is_flac {
            return Err(ToneTwistError::Conversion {
                message: "transcoder output is not a FLAC stream".to_string(),
            });
        }

        if info.sample_rate != defaults::SAMPLE_RATE || info.channels != defaults::CHANNELS {
            return Err(ToneTwistError::Conversion {
                message: format!(
                    "transcoder produced {} Hz / {} channel(s), expected {} Hz mono",
                    info.sample_rate,
                    info.channels,
                    defaults::SAMPLE_RATE
                ),
            });
        }

        Ok(Self {
            bytes,
            duration: info.duration,
        })
    }

    /// Wrap bytes the caller vouches for as mono 16 kHz FLAC, unread.
    pub fn trusted(bytes: Vec<u8>, duration: Option<Duration>) -> Self {
        Self { bytes, duration }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Clip duration, when the encoder recorded it.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

/// Converts uploaded audio into the recognizer's input format.
#[async_trait::async_trait]
pub trait AudioNormalizer: Send + Sync {
    async fn normalize(&self, payload: &AudioPayload) -> Result<NormalizedAudio>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Normalizer backed by an ffmpeg subprocess.
#[derive(Debug, Clone)]
pub struct FfmpegNormalizer {
    ffmpeg: PathBuf,
    temp_root: Option<PathBuf>,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            temp_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            temp_root: config.temp_dir.clone(),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tonetwist-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| ToneTwistError::Conversion {
            message: format!("failed to create scratch directory: {e}"),
        })
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
            .arg(input)
            .args(["-vn", "-ac", "1", "-ar"])
            .arg(defaults::SAMPLE_RATE.to_string())
            .args(["-c:a", "flac", "-f", "flac"])
            .arg(output)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToneTwistError::Conversion {
                    message: format!("transcoder not found at '{}'", self.ffmpeg.display()),
                });
            }
            Err(e) => {
                return Err(ToneTwistError::Conversion {
                    message: format!("failed to run transcoder: {e}"),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToneTwistError::Conversion {
                message: format!("transcoder exited with {}: {}", output.status, tail(&stderr, 400)),
            });
        }

        Ok(())
    }
}

impl Default for FfmpegNormalizer {
    fn default() -> Self {
        Self::new(defaults::FFMPEG_BINARY)
    }
}

#[async_trait::async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(&self, payload: &AudioPayload) -> Result<NormalizedAudio> {
        let scratch = self.scratch_dir()?;
        let input_path = scratch.path().join(format!("input.{}", payload.container()));
        let output_path = scratch.path().join("output.flac");

        tokio::fs::write(&input_path, payload.bytes())
            .await
            .map_err(|e| ToneTwistError::Conversion {
                message: format!("failed to write transcoder input: {e}"),
            })?;

        tracing::debug!(
            filename = payload.filename(),
            container = %payload.container(),
            bytes = payload.size(),
            "Starting audio conversion"
        );

        self.transcode(&input_path, &output_path).await?;

        let bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) if bytes.is_empty() => {
                return Err(ToneTwistError::Conversion {
                    message: "transcoder produced an empty output file".to_string(),
                });
            }
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToneTwistError::Conversion {
                    message: "transcoder produced no output file".to_string(),
                });
            }
            Err(e) => {
                return Err(ToneTwistError::Conversion {
                    message: format!("failed to read transcoder output: {e}"),
                });
            }
        };

        let normalized = NormalizedAudio::from_flac(bytes)?;

        tracing::debug!(
            bytes = normalized.bytes().len(),
            duration_ms = normalized.duration().map(|d| d.as_millis() as u64),
            "Audio conversion finished"
        );

        // Error paths rely on Drop; here a failed removal is worth a warning.
        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::warn!(path = %scratch_path.display(), error = %e, "Failed to remove scratch directory");
        }

        Ok(normalized)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Last `max` bytes of process output, on a char boundary.
fn tail(text: &str, max: usize) -> &str {
    let text = text.trim();
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Stand-in normalizer for tests: emits placeholder FLAC bytes with a fixed duration.
#[derive(Debug, Default)]
pub struct MockNormalizer {
    duration_secs: u64,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockNormalizer {
    pub fn new() -> Self {
        Self {
            duration_secs: 3,
            ..Self::default()
        }
    }

    /// Duration reported for the emitted audio.
    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Configure the mock to fail with a conversion error
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AudioNormalizer for MockNormalizer {
    async fn normalize(&self, _payload: &AudioPayload) -> Result<NormalizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(ToneTwistError::Conversion {
                message: "mock conversion failure".to_string(),
            });
        }
        Ok(NormalizedAudio::trusted(
            b"fLaC".to_vec(),
            Some(Duration::from_secs(self.duration_secs)),
        ))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
