//! Shelf and playback configuration.
//!
//! [`ShelfOptions`] is a builder that threads file locations, backend
//! selection, and pacing parameters through the catalog, preview, and
//! playback components without widening every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidshelf::{Backend, PlaybackOptions, ShelfOptions};
//!
//! let options = ShelfOptions::new()
//!     .with_catalog_path("library/videos.json")
//!     .with_thumbnail_directory("library/thumbnails")
//!     .with_backend(Backend::FramePump)
//!     .with_playback(PlaybackOptions::new().with_pause_poll_interval(Duration::from_millis(50)));
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ShelfError;

/// Frame rate assumed when a source reports zero or an unknown rate.
pub const FALLBACK_FRAMES_PER_SECOND: f64 = 30.0;

/// Lowest speed multiplier the playback engine will accept.
pub const MIN_SPEED: f64 = 0.25;

/// Speed change applied by a single "slower"/"faster" step.
pub const SPEED_STEP: f64 = 0.25;

/// Shortest pause poll interval the pacing loop will sleep for.
pub const MIN_PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Which media backend plays a selected video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Decode in-process with FFmpeg and pace frames ourselves. This is the
    /// default.
    #[default]
    FramePump,
    /// Pace frames piped out of an external `ffmpeg` process.
    Subprocess,
    /// Hand the URL to an external player program and step aside.
    ExternalPlayer,
}

impl Backend {
    /// Returns `true` if this backend drives a
    /// [`PlaybackEngine`](crate::PlaybackEngine).
    pub fn uses_engine(self) -> bool {
        !matches!(self, Backend::ExternalPlayer)
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Backend::FramePump => "pump",
            Backend::Subprocess => "subprocess",
            Backend::ExternalPlayer => "player",
        };
        f.write_str(name)
    }
}

impl FromStr for Backend {
    type Err = ShelfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pump" | "frame-pump" | "ffmpeg" => Ok(Backend::FramePump),
            "subprocess" | "pipe" => Ok(Backend::Subprocess),
            "player" | "external" | "ffplay" => Ok(Backend::ExternalPlayer),
            _ => Err(ShelfError::InvalidOption {
                kind: "backend",
                value: value.to_string(),
            }),
        }
    }
}

/// Pacing parameters for the playback engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOptions {
    /// Frame rate used when the source reports none.
    pub fallback_frames_per_second: f64,
    /// How long the pacing loop sleeps between checks while paused.
    pub pause_poll_interval: Duration,
    /// Step used by the UI's slower/faster controls.
    pub speed_step: f64,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackOptions {
    /// Defaults: fallback 30 fps, 100 ms pause poll, 0.25 speed step.
    pub fn new() -> Self {
        Self {
            fallback_frames_per_second: FALLBACK_FRAMES_PER_SECOND,
            pause_poll_interval: Duration::from_millis(100),
            speed_step: SPEED_STEP,
        }
    }

    /// Set the frame rate assumed for sources that report none.
    ///
    /// Non-positive or non-finite values are ignored.
    #[must_use]
    pub fn with_fallback_frames_per_second(mut self, frames_per_second: f64) -> Self {
        if frames_per_second.is_finite() && frames_per_second > 0.0 {
            self.fallback_frames_per_second = frames_per_second;
        }
        self
    }

    /// Set the paused-state poll interval, at least
    /// [`MIN_PAUSE_POLL_INTERVAL`].
    #[must_use]
    pub fn with_pause_poll_interval(mut self, interval: Duration) -> Self {
        self.pause_poll_interval = interval.max(MIN_PAUSE_POLL_INTERVAL);
        self
    }

    /// Set the speed change applied per slower/faster step.
    #[must_use]
    pub fn with_speed_step(mut self, step: f64) -> Self {
        self.speed_step = step.abs();
        self
    }
}

/// Top-level configuration for a shelf.
///
/// All fields have defaults matching a library kept in the working
/// directory: `videos.json` next to a `thumbnails/` folder of `.jpg` stills.
#[derive(Clone)]
pub struct ShelfOptions {
    pub(crate) catalog_path: PathBuf,
    pub(crate) thumbnail_directory: PathBuf,
    pub(crate) thumbnail_extension: String,
    pub(crate) backend: Backend,
    pub(crate) ffmpeg_program: String,
    pub(crate) player_program: String,
    pub(crate) playback: PlaybackOptions,
}

impl Debug for ShelfOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ShelfOptions")
            .field("catalog_path", &self.catalog_path)
            .field("thumbnail_directory", &self.thumbnail_directory)
            .field("thumbnail_extension", &self.thumbnail_extension)
            .field("backend", &self.backend)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl Default for ShelfOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ShelfOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            catalog_path: PathBuf::from("videos.json"),
            thumbnail_directory: PathBuf::from("thumbnails"),
            thumbnail_extension: "jpg".to_string(),
            backend: Backend::default(),
            ffmpeg_program: "ffmpeg".to_string(),
            player_program: "ffplay".to_string(),
            playback: PlaybackOptions::default(),
        }
    }

    /// Set the catalog file location.
    #[must_use]
    pub fn with_catalog_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.catalog_path = path.into();
        self
    }

    /// Set the directory thumbnails are written to.
    #[must_use]
    pub fn with_thumbnail_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.thumbnail_directory = directory.into();
        self
    }

    /// Set the thumbnail file extension, which also selects the encoder.
    ///
    /// A leading dot is stripped; an empty extension is ignored.
    #[must_use]
    pub fn with_thumbnail_extension(mut self, extension: &str) -> Self {
        let cleaned = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        if !cleaned.is_empty() {
            self.thumbnail_extension = cleaned;
        }
        self
    }

    /// Select the playback backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Program used by [`Backend::Subprocess`]. Defaults to `ffmpeg`.
    #[must_use]
    pub fn with_ffmpeg_program(mut self, program: &str) -> Self {
        self.ffmpeg_program = program.to_string();
        self
    }

    /// Program used by [`Backend::ExternalPlayer`]. Defaults to `ffplay`.
    #[must_use]
    pub fn with_player_program(mut self, program: &str) -> Self {
        self.player_program = program.to_string();
        self
    }

    /// Set the playback pacing parameters.
    #[must_use]
    pub fn with_playback(mut self, playback: PlaybackOptions) -> Self {
        self.playback = playback;
        self
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn thumbnail_directory(&self) -> &Path {
        &self.thumbnail_directory
    }

    pub fn thumbnail_extension(&self) -> &str {
        &self.thumbnail_extension
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn ffmpeg_program(&self) -> &str {
        &self.ffmpeg_program
    }

    pub fn player_program(&self) -> &str {
        &self.player_program
    }

    pub fn playback(&self) -> &PlaybackOptions {
        &self.playback
    }
}
