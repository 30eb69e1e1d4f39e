//! Error types for the `vidshelf` crate.
//!
//! This module defines [`ShelfError`], the unified error type returned by all
//! fallible operations in the crate. Most user-facing operations recover from
//! these errors locally (an unreadable catalog loads as empty, a failed
//! preview reports [`PreviewOutcome::Unavailable`](crate::PreviewOutcome)),
//! but the error values are still surfaced through the `try_*` variants and
//! through the log.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `vidshelf` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShelfError {
    /// A decode session could not be opened for the given source.
    #[error("Source unavailable at {url}: {reason}")]
    SourceUnavailable {
        /// URL or path that was passed to the session opener.
        url: String,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source opened but does not contain a video stream.
    #[error("No video stream found in source")]
    NoVideoStream,

    /// Reading the next frame failed. Playback treats this like end of
    /// stream and loops back to the start.
    #[error("Failed to read frame: {0}")]
    FrameRead(String),

    /// The catalog file could not be read or written.
    #[error("Catalog persistence failed for {path}: {reason}")]
    Persistence {
        /// Catalog file path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A record is missing a required field.
    #[error("Invalid video record: {0} must not be empty")]
    Validation(&'static str),

    /// A frame buffer does not match its declared dimensions.
    #[error("Frame buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    InvalidFrame {
        /// Declared frame width.
        width: u32,
        /// Declared frame height.
        height: u32,
        /// Bytes required by the declared dimensions and layout.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// The external player program could not be started.
    #[error("Failed to launch player `{program}`: {reason}")]
    PlayerLaunch {
        /// Program that was spawned.
        program: String,
        /// Underlying reason.
        reason: String,
    },

    /// A configuration value could not be parsed.
    #[error("Invalid {kind}: {value}")]
    InvalidOption {
        /// What was being parsed (e.g. `"backend"`).
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding or decoding a still.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The catalog JSON could not be serialized or parsed.
    #[error("Catalog format error: {0}")]
    JsonError(#[from] JsonError),
}

impl From<FfmpegError> for ShelfError {
    fn from(error: FfmpegError) -> Self {
        ShelfError::FfmpegError(error.to_string())
    }
}
