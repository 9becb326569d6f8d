//! WAV header inspection.
//!
//! WAV is the one common upload container whose header declares the clip
//! length, so its duration can be checked before anything is transcoded.

use crate::error::{Result, ToneTwistError};
use std::io::Cursor;
use std::time::Duration;

/// Format facts read from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel
    pub frames: u32,
}

impl WavInfo {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(f64::from(self.frames) / f64::from(self.sample_rate))
    }
}

/// Read format and length from in-memory WAV data without decoding samples.
pub fn read_header(bytes: &[u8]) -> Result<WavInfo> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        ToneTwistError::validation(format!("Failed to parse WAV header: {}", e))
    })?;
    let spec = reader.spec();

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames: reader.duration(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn reads_16khz_mono_reports_duration() {
        let wav_data = make_wav_data(16000, 1, &vec![0i16; 16000 * 3]);

        let info = read_header(&wav_data).unwrap();

        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.frames, 48000);
        assert_eq!(info.duration(), Duration::from_secs(3));
    }

    #[test]
    fn stereo_header_counts_frames_per_channel() {
        // 1 second of 44.1kHz stereo = 88200 interleaved samples
        let wav_data = make_wav_data(44100, 2, &vec![0i16; 88200]);

        let info = read_header(&wav_data).unwrap();

        assert_eq!(info.channels, 2);
        assert_eq!(info.frames, 44100);
        assert_eq!(info.duration(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_garbage() {
        let result = read_header(&[0, 1, 2, 3]);
        assert!(matches!(result, Err(ToneTwistError::Validation { .. })));
    }

    #[test]
    fn zero_sample_rate_has_zero_duration() {
        let info = WavInfo {
            sample_rate: 0,
            channels: 1,
            frames: 100,
        };
        assert_eq!(info.duration(), Duration::ZERO);
    }
}
