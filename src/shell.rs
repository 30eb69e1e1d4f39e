//! Application shell.
//!
//! [`Shell`] ties the components together the way the launcher's surfaces
//! use them: [`settings`](Shell::settings) registers videos (preview + save),
//! [`start`](Shell::start) opens the grid over a freshly loaded catalog, and
//! [`play`](Shell::play) starts playback with the configured backend.
//!
//! # Example
//!
//! ```no_run
//! use vidshelf::{Frame, Playback, Shell, ShelfOptions};
//!
//! let shell = Shell::new(ShelfOptions::default());
//! let settings = shell.settings();
//! settings.generate_preview("input.mp4", "Clip A");
//! settings.save("input.mp4", "Clip A");
//!
//! let browser = shell.start();
//! if let Some(url) = browser.activate(0) {
//!     let playback = shell.play(url, |_frame: &Frame| {})?;
//!     if let Playback::Engine(mut engine) = playback {
//!         engine.close();
//!     }
//! }
//! # Ok::<(), vidshelf::ShelfError>(())
//! ```

use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use crate::browser::CatalogBrowser;
use crate::catalog::{CatalogStore, VideoRecord};
use crate::configuration::{Backend, ShelfOptions};
use crate::error::ShelfError;
use crate::playback::{FrameSink, PlaybackEngine};
use crate::preview::{PreviewGenerator, PreviewOutcome};
use crate::session::{FfmpegOpener, SessionOpener, SubprocessOpener};

/// A started playback.
#[derive(Debug)]
pub enum Playback {
    /// Frames are paced by this process.
    Engine(PlaybackEngine),
    /// The URL was handed to an external player, which now owns playback.
    Handoff(Child),
}

/// Top-level navigation between the settings and start surfaces.
#[derive(Debug, Clone)]
pub struct Shell {
    options: ShelfOptions,
}

impl Shell {
    pub fn new(options: ShelfOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ShelfOptions {
        &self.options
    }

    pub fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.options.catalog_path())
    }

    /// Session opener for the configured backend.
    ///
    /// [`Backend::ExternalPlayer`] does not decode in-process; previews for
    /// it are still produced with FFmpeg.
    pub fn opener(&self) -> Arc<dyn SessionOpener> {
        match self.options.backend() {
            Backend::Subprocess => Arc::new(SubprocessOpener::new(self.options.ffmpeg_program())),
            Backend::FramePump | Backend::ExternalPlayer => Arc::new(FfmpegOpener),
        }
    }

    /// Open the settings surface. Creates the thumbnail directory.
    pub fn settings(&self) -> SettingsForm {
        self.settings_with_opener(self.opener())
    }

    /// Open the settings surface with a specific session opener.
    pub fn settings_with_opener(&self, opener: Arc<dyn SessionOpener>) -> SettingsForm {
        SettingsForm {
            catalog: self.catalog(),
            previews: PreviewGenerator::new(
                self.options.thumbnail_directory(),
                self.options.thumbnail_extension(),
                opener,
            ),
        }
    }

    /// Open the start surface over the current catalog.
    pub fn start(&self) -> CatalogBrowser {
        CatalogBrowser::new(&self.catalog().load())
    }

    /// Start playing `url` with the configured backend.
    ///
    /// # Errors
    ///
    /// - [`ShelfError::SourceUnavailable`] if an engine backend cannot open
    ///   the source.
    /// - [`ShelfError::PlayerLaunch`] if the external player cannot start.
    pub fn play<S: FrameSink + 'static>(&self, url: &str, sink: S) -> Result<Playback, ShelfError> {
        match self.options.backend() {
            Backend::ExternalPlayer => self.hand_off(url).map(Playback::Handoff),
            Backend::FramePump | Backend::Subprocess => {
                PlaybackEngine::open(url, self.opener(), sink, self.options.playback())
                    .map(Playback::Engine)
            }
        }
    }

    fn hand_off(&self, url: &str) -> Result<Child, ShelfError> {
        let program = self.options.player_program();
        log::info!("Handing {url} to `{program}`");
        Command::new(program)
            .arg(url)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|error| ShelfError::PlayerLaunch {
                program: program.to_string(),
                reason: error.to_string(),
            })
    }
}

/// The settings surface: register a URL under a name.
pub struct SettingsForm {
    catalog: CatalogStore,
    previews: PreviewGenerator,
}

impl SettingsForm {
    pub fn previews(&self) -> &PreviewGenerator {
        &self.previews
    }

    /// Generate the thumbnail for `name` from `url`.
    ///
    /// Empty inputs do nothing and report
    /// [`PreviewOutcome::Unavailable`].
    pub fn generate_preview(&self, url: &str, name: &str) -> PreviewOutcome {
        if url.trim().is_empty() || name.trim().is_empty() {
            return PreviewOutcome::Unavailable;
        }
        let destination = self.previews.path_for(name);
        self.previews.generate(url, &destination)
    }

    /// Build the record `save` would write. The preview path is set only if
    /// a thumbnail for `name` exists on disk.
    pub fn record_for(&self, url: &str, name: &str) -> VideoRecord {
        let record = VideoRecord::new(url, name);
        let preview = self.previews.path_for(name);
        if preview.is_file() {
            record.with_preview_path(preview.to_string_lossy())
        } else {
            record
        }
    }

    /// Append `url` under `name` to the catalog.
    ///
    /// Returns `false` without touching the catalog if either is empty.
    pub fn save(&self, url: &str, name: &str) -> bool {
        self.catalog.save(self.record_for(url, name))
    }
}
