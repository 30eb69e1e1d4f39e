//! FFmpeg initialisation and log level control.
//!
//! FFmpeg keeps its own console logger, separate from the Rust
//! [`log`](https://crates.io/crates/log) facade used everywhere else in this
//! crate. Decoding network streams in particular makes FFmpeg chatty on
//! stderr, which would scribble over the terminal frame sink, so the CLI
//! lowers it to `error` unless asked otherwise.
//!
//! # Example
//!
//! ```no_run
//! use vidshelf::FfmpegLogLevel;
//!
//! vidshelf::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let level: FfmpegLogLevel = "quiet".parse().unwrap();
//! vidshelf::set_ffmpeg_log_level(level);
//! ```

use std::str::FromStr;
use std::sync::OnceLock;

use ffmpeg_next::util::log::Level;

use crate::error::ShelfError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialise FFmpeg once per process.
///
/// Safe to call from any thread and any number of times; only the first
/// call does work and its outcome is remembered, so a failed
/// initialisation keeps failing. Failures are reported as
/// [`ShelfError::SourceUnavailable`] against `url`, since nothing can be
/// decoded without the library.
pub(crate) fn ensure_initialized(url: &str) -> Result<(), ShelfError> {
    cached_initialization(&INIT, url, || ffmpeg_next::init().map_err(|error| error.to_string()))
}

fn cached_initialization(
    cell: &OnceLock<Result<(), String>>,
    url: &str,
    initialize: impl FnOnce() -> Result<(), String>,
) -> Result<(), ShelfError> {
    let outcome = cell.get_or_init(|| {
        let result = initialize();
        match &result {
            Ok(()) => log::debug!("FFmpeg initialised"),
            Err(reason) => log::error!("FFmpeg initialisation failed: {reason}"),
        }
        result
    });
    outcome.clone().map_err(|reason| ShelfError::SourceUnavailable {
        url: url.to_string(),
        reason: format!("FFmpeg initialisation failed: {reason}"),
    })
}

/// FFmpeg internal log verbosity level.
///
/// Maps directly to FFmpeg's `AV_LOG_*` constants. Setting a level causes
/// FFmpeg to suppress all messages below that severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's own default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging messages.
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Option<Self> {
        match level {
            Level::Quiet => Some(FfmpegLogLevel::Quiet),
            Level::Panic | Level::Fatal => Some(FfmpegLogLevel::Fatal),
            Level::Error => Some(FfmpegLogLevel::Error),
            Level::Warning => Some(FfmpegLogLevel::Warning),
            Level::Info | Level::Verbose => Some(FfmpegLogLevel::Info),
            Level::Debug | Level::Trace => Some(FfmpegLogLevel::Debug),
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = ShelfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(FfmpegLogLevel::Quiet),
            "fatal" | "panic" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" | "verbose" => Ok(FfmpegLogLevel::Info),
            "debug" | "trace" => Ok(FfmpegLogLevel::Debug),
            _ => Err(ShelfError::InvalidOption {
                kind: "log level",
                value: value.to_string(),
            }),
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This controls what FFmpeg prints to stderr. It does **not** affect
/// Rust-side `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Get the current FFmpeg internal log verbosity level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .and_then(FfmpegLogLevel::from_ffmpeg_level)
}
