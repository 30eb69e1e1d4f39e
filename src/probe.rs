//! Lightweight source probing.
//!
//! [`SourceProbe`] reads a source's container and video stream metadata
//! without keeping the demuxer open or decoding any frames. The subprocess
//! backend uses it to learn frame geometry before spawning `ffmpeg`, and the
//! CLI's `info` command prints it.

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{codec::context::Context as CodecContext, media::Type};

use crate::error::ShelfError;

/// Metadata for the best video stream of a source.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SourceInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Reported frames per second, `0.0` if the container does not say.
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container duration, zero for live streams.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

/// Lightweight source probe.
///
/// # Example
///
/// ```no_run
/// use vidshelf::SourceProbe;
///
/// let info = SourceProbe::probe("input.mp4")?;
/// println!("{}x{} @ {:.2} fps", info.width, info.height, info.frames_per_second);
/// # Ok::<(), vidshelf::ShelfError>(())
/// ```
pub struct SourceProbe;

impl SourceProbe {
    /// Probe a path or URL.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::SourceUnavailable`] if the source cannot be
    /// opened, or [`ShelfError::NoVideoStream`] if it has no video.
    pub fn probe(url: &str) -> Result<SourceInfo, ShelfError> {
        crate::ffmpeg::ensure_initialized(url)?;
        log::debug!("Probing {url}");

        let unavailable = |reason: String| ShelfError::SourceUnavailable {
            url: url.to_string(),
            reason,
        };

        let input_context = ffmpeg_next::format::input(Path::new(url))
            .map_err(|error| unavailable(error.to_string()))?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };
        let format = input_context.format().name().to_string();

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(ShelfError::NoVideoStream)?;
        let frames_per_second = {
            let average = crate::utilities::rational_to_frames_per_second(stream.avg_frame_rate());
            if average > 0.0 {
                average
            } else {
                crate::utilities::rational_to_frames_per_second(stream.rate())
            }
        };

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| unavailable(format!("Failed to inspect video stream: {error}")))?;

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(SourceInfo {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            codec,
            duration,
            format,
        })
    }
}
