//! Thumbnail preview generation.
//!
//! [`PreviewGenerator`] decodes the first frame of a source and stores it as
//! a still image under a thumbnails directory. Generation never fails loudly:
//! an unreachable URL, a corrupt stream, or an encoder error all come back
//! as [`PreviewOutcome::Unavailable`] and a log line.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidshelf::{FfmpegOpener, PreviewGenerator, PreviewOutcome};
//!
//! let generator = PreviewGenerator::new("thumbnails", "jpg", Arc::new(FfmpegOpener));
//! let destination = generator.path_for("Clip A");
//! if let PreviewOutcome::Saved(path) = generator.generate("input.mp4", &destination) {
//!     println!("preview at {}", path.display());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, imageops::FilterType};

use crate::catalog::VideoRecord;
use crate::error::ShelfError;
use crate::session::{SessionGuard, SessionOpener};

/// Bounding box used when a stored preview is shown next to the form.
pub const DISPLAY_MAX_WIDTH: u32 = 200;
/// See [`DISPLAY_MAX_WIDTH`].
pub const DISPLAY_MAX_HEIGHT: u32 = 150;

/// Result of a preview attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// A still was written to this path.
    Saved(PathBuf),
    /// No still could be produced; nothing was written.
    Unavailable,
}

impl PreviewOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PreviewOutcome::Saved(_))
    }
}

/// Writes first-frame stills for sources.
pub struct PreviewGenerator {
    directory: PathBuf,
    extension: String,
    opener: Arc<dyn SessionOpener>,
}

impl PreviewGenerator {
    /// Create a generator writing `<directory>/<name>.<extension>` files.
    ///
    /// The directory is created here if it does not already exist. Failure
    /// to create it is logged; later writes will then report
    /// [`PreviewOutcome::Unavailable`].
    pub fn new<P: Into<PathBuf>>(
        directory: P,
        extension: &str,
        opener: Arc<dyn SessionOpener>,
    ) -> Self {
        let directory = directory.into();
        if let Err(error) = fs::create_dir_all(&directory) {
            log::warn!(
                "Could not create thumbnail directory {}: {error}",
                directory.display()
            );
        }
        Self {
            directory,
            extension: extension.trim_start_matches('.').to_string(),
            opener,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Thumbnail location for a record name. A second record with the same
    /// name overwrites the first still.
    ///
    /// The path always lies directly inside the thumbnail directory: path
    /// separators and leading dots in `name` become `_`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let stem = file_stem_for(name);
        self.directory.join(format!("{stem}.{}", self.extension))
    }

    /// Decode one frame of `url` and save it at `destination`.
    ///
    /// The decode session is released on every path out of this call.
    pub fn generate(&self, url: &str, destination: &Path) -> PreviewOutcome {
        match self.try_generate(url, destination) {
            Ok(true) => {
                log::info!("Preview for {url} saved to {}", destination.display());
                PreviewOutcome::Saved(destination.to_path_buf())
            }
            Ok(false) => {
                log::warn!("Preview unavailable for {url}: no frame could be read");
                PreviewOutcome::Unavailable
            }
            Err(error) => {
                log::warn!("Preview unavailable for {url}: {error}");
                PreviewOutcome::Unavailable
            }
        }
    }

    /// Returns `Ok(false)` when the source produced no frame.
    fn try_generate(&self, url: &str, destination: &Path) -> Result<bool, ShelfError> {
        let mut guard = SessionGuard::new(self.opener.open(url)?);
        let Some(frame) = guard.session().next_frame()? else {
            return Ok(false);
        };
        drop(guard);

        frame.into_image()?.save(destination)?;
        Ok(true)
    }

    /// Load a stored preview scaled to fit the 200×150 display box.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::ImageError`] if the file cannot be decoded.
    pub fn display_thumbnail(path: &Path) -> Result<DynamicImage, ShelfError> {
        let image = image::open(path)?;
        let (width, height) = crate::utilities::fit_within(
            image.width(),
            image.height(),
            DISPLAY_MAX_WIDTH,
            DISPLAY_MAX_HEIGHT,
        );
        Ok(image.resize_exact(width, height, FilterType::Triangle))
    }

    /// Regenerate stills for records whose stored preview has gone stale.
    ///
    /// Only records that name a preview file which no longer exists are
    /// considered; each still is rewritten at the record's own preview path,
    /// so the catalog does not need rewriting. With the `rayon` feature,
    /// sources are decoded in parallel.
    pub fn refresh_stale(&self, records: &[VideoRecord]) -> Vec<(String, PreviewOutcome)> {
        let jobs: Vec<RefreshJob<'_>> = records
            .iter()
            .filter(|record| {
                record.validate().is_ok()
                    && !record.preview_path.is_empty()
                    && record.existing_preview().is_none()
            })
            .map(|record| RefreshJob {
                name: &record.name,
                url: &record.url,
                destination: Path::new(&record.preview_path),
            })
            .collect();
        log::debug!("{} of {} record(s) have a stale preview", jobs.len(), records.len());

        #[cfg(feature = "rayon")]
        {
            crate::rayon::parallel_refresh(self, &jobs)
        }

        #[cfg(not(feature = "rayon"))]
        {
            jobs.iter().map(|job| job.run(self)).collect()
        }
    }
}

/// File stem for a record name, with separators and leading dots replaced.
fn file_stem_for(name: &str) -> String {
    let mut leading = true;
    name.chars()
        .map(|character| {
            let replace = matches!(character, '/' | '\\' | '\0') || (leading && character == '.');
            leading &= replace;
            if replace { '_' } else { character }
        })
        .collect()
}

/// One stale preview to regenerate.
pub(crate) struct RefreshJob<'a> {
    name: &'a str,
    url: &'a str,
    destination: &'a Path,
}

impl RefreshJob<'_> {
    pub(crate) fn run(&self, generator: &PreviewGenerator) -> (String, PreviewOutcome) {
        if let Some(parent) = self.destination.parent() {
            let _ = fs::create_dir_all(parent);
        }
        (self.name.to_string(), generator.generate(self.url, self.destination))
    }
}

#[cfg(test)]
mod tests {
    use super::file_stem_for;

    #[test]
    fn plain_names_are_kept() {
        assert_eq!(file_stem_for("Clip A"), "Clip A");
        assert_eq!(file_stem_for("v1.2 final"), "v1.2 final");
    }

    #[test]
    fn separators_and_leading_dots_are_replaced() {
        assert_eq!(file_stem_for("../x"), "___x");
        assert_eq!(file_stem_for("a/b"), "a_b");
        assert_eq!(file_stem_for("a\\b"), "a_b");
        assert_eq!(file_stem_for(".hidden"), "_hidden");
        assert_eq!(file_stem_for(".."), "__");
    }
}
