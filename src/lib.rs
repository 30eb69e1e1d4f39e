//! # vidshelf
//!
//! A small video library launcher: register video URLs with generated
//! thumbnail previews, browse them as a grid, and play them with a paced
//! frame pump.
//!
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; stills are
//! written with [`image`](https://crates.io/crates/image).
//!
//! ## Quick Start
//!
//! ### Register a Video
//!
//! ```no_run
//! use vidshelf::{Shell, ShelfOptions};
//!
//! let shell = Shell::new(ShelfOptions::default());
//! let settings = shell.settings();
//! settings.generate_preview("https://example.com/clip.mp4", "Clip");
//! assert!(settings.save("https://example.com/clip.mp4", "Clip"));
//! ```
//!
//! ### Play It
//!
//! ```no_run
//! use std::{thread, time::Duration};
//!
//! use vidshelf::{Frame, Playback, Shell, ShelfOptions};
//!
//! let shell = Shell::new(ShelfOptions::default());
//! let browser = shell.start();
//! let url = browser.activate(0).expect("catalog is empty");
//!
//! if let Playback::Engine(mut engine) = shell.play(url, |frame: &Frame| {
//!     let _ = frame.data();
//! })? {
//!     engine.change_speed(0.5);
//!     thread::sleep(Duration::from_secs(5));
//!     engine.close();
//! }
//! # Ok::<(), vidshelf::ShelfError>(())
//! ```
//!
//! ## Components
//!
//! - **Catalog** ([`CatalogStore`]): ordered list of [`VideoRecord`]s in a
//!   single JSON file, rewritten on every append
//! - **Previews** ([`PreviewGenerator`]): first-frame stills under a
//!   thumbnails directory
//! - **Playback** ([`PlaybackEngine`]): background pacing loop with
//!   play/pause, speed control, and loop-at-end-of-stream
//! - **Browser** ([`CatalogBrowser`]): three-column grid of tiles
//! - **Shell** ([`Shell`]): settings/start navigation and backend selection
//!
//! ### Backends
//!
//! | [`Backend`] | Behaviour |
//! |-------------|-----------|
//! | `FramePump` | In-process FFmpeg decode, paced by [`PlaybackEngine`] |
//! | `Subprocess` | Raw frames piped from an `ffmpeg` child, paced by [`PlaybackEngine`] |
//! | `ExternalPlayer` | URL handed to a player program (default `ffplay`) |
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Regenerate stale previews in parallel |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. The
//! `Subprocess` and `ExternalPlayer` backends additionally need the `ffmpeg`
//! and `ffplay` programs on `PATH` (or configured explicitly).

pub mod browser;
pub mod catalog;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod playback;
pub mod preview;
pub mod probe;
#[cfg(feature = "rayon")]
mod rayon;
pub mod session;
pub mod shell;
mod utilities;

pub use browser::{CatalogBrowser, GRID_COLUMNS, Tile};
pub use catalog::{CatalogStore, VideoRecord};
pub use configuration::{
    Backend, FALLBACK_FRAMES_PER_SECOND, MIN_PAUSE_POLL_INTERVAL, MIN_SPEED, PlaybackOptions,
    SPEED_STEP, ShelfOptions,
};
pub use error::ShelfError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use playback::{FrameSink, PlaybackEngine, PlaybackState};
pub use preview::{PreviewGenerator, PreviewOutcome};
pub use probe::{SourceInfo, SourceProbe};
pub use session::{
    DecodeSession, FfmpegOpener, FfmpegSession, Frame, PixelLayout, SessionOpener,
    SubprocessOpener, SubprocessSession,
};
pub use shell::{Playback, SettingsForm, Shell};
pub use utilities::{effective_frames_per_second, fit_within, paced_delay};
