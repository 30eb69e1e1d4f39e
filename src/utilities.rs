//! Internal utility functions.
//!
//! Helpers for pixel-data copying, frame-rate arithmetic, and other shared
//! logic that does not belong in any single public module.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// `bytes_per_pixel` is 3 for the packed 24-bit layouts this crate uses.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert a stream rate to frames per second, or `0.0` if the rate is
/// unset.
pub(crate) fn rational_to_frames_per_second(rate: Rational) -> f64 {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

/// Substitute `fallback` for a zero, negative, or non-finite frame rate.
pub fn effective_frames_per_second(reported: f64, fallback: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        fallback
    }
}

/// Per-frame delay for a native interval played at `speed`.
///
/// `speed` is expected to be at least [`MIN_SPEED`](crate::MIN_SPEED); a
/// non-positive value yields the native interval unchanged.
pub fn paced_delay(native_interval: Duration, speed: f64) -> Duration {
    if speed.is_finite() && speed > 0.0 {
        native_interval.div_f64(speed)
    } else {
        native_interval
    }
}

/// Compute dimensions that fit within a `max_width` × `max_height` box
/// preserving aspect ratio.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_width.max(1), max_height.max(1));
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64) * scale).round() as u32;
    let new_height = ((height as f64) * scale).round() as u32;
    (new_width.max(1), new_height.max(1))
}
