//! Container inspection via symphonia: codec, format and declared length.
//!
//! Only the container headers are read; no packets are decoded.

use crate::error::{Result, ToneTwistError};
use std::io::Cursor;
use std::time::Duration;
use symphonia::core::codecs::{CODEC_TYPE_FLAC, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Format of the default track of an in-memory audio file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub is_flac: bool,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per channel, when the container declares them.
    pub frames: Option<u64>,
    /// Declared length; `None` for streams that don't record it.
    pub duration: Option<Duration>,
}

/// Read the container headers of `bytes`.
///
/// `extension` is only a hint; the format is detected from the data.
pub fn inspect(bytes: &[u8], extension: Option<&str>) -> Result<MediaInfo> {
    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions {
        enable_gapless: false,
        ..Default::default()
    };

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| ToneTwistError::Conversion {
            message: format!("unrecognized audio container: {e}"),
        })?;

    let track = detected
        .format
        .default_track()
        .filter(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ToneTwistError::Conversion {
            message: "no audio track found".to_string(),
        })?;

    let params = &track.codec_params;
    let sample_rate = params.sample_rate.unwrap_or(0);
    let duration = match (params.n_frames, params.time_base, params.sample_rate) {
        (Some(0), ..) | (None, ..) => None,
        (Some(frames), Some(tb), _) if tb.denom != 0 => Some(Duration::from_secs_f64(
            frames as f64 * f64::from(tb.numer) / f64::from(tb.denom),
        )),
        (Some(frames), _, Some(rate)) if rate != 0 => {
            Some(Duration::from_secs_f64(frames as f64 / f64::from(rate)))
        }
        _ => None,
    };

    Ok(MediaInfo {
        is_flac: params.codec == CODEC_TYPE_FLAC,
        sample_rate,
        channels: params.channels.map_or(0, |c| c.count() as u16),
        frames: params.n_frames,
        duration,
    })
}
