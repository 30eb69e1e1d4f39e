//! The persisted video catalog.
//!
//! The catalog is a flat, ordered list of [`VideoRecord`]s stored as a single
//! JSON array. There is no long-lived in-memory copy: every read loads the
//! whole file and every write rewrites it, so the file on disk is always the
//! source of truth.
//!
//! Writes are not atomic with respect to other writers. Two processes
//! appending at once can lose one record (last writer wins); this tool is
//! single-user and single-process, and that is a known limitation.
//!
//! # Example
//!
//! ```no_run
//! use vidshelf::{CatalogStore, VideoRecord};
//!
//! let store = CatalogStore::new("videos.json");
//! let saved = store.save(VideoRecord::new("https://example.com/a.mp4", "Clip A"));
//! assert!(saved);
//! for record in store.load() {
//!     println!("{} -> {}", record.name, record.url);
//! }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

/// One registered video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Source URI: a stream URL or a file path.
    pub url: String,
    /// Display label.
    pub name: String,
    /// Path to a generated still image. Empty means no preview.
    #[serde(rename = "preview", default)]
    pub preview_path: String,
}

impl VideoRecord {
    /// Create a record without a preview.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            preview_path: String::new(),
        }
    }

    /// Attach a preview image path.
    #[must_use]
    pub fn with_preview_path(mut self, path: impl Into<String>) -> Self {
        self.preview_path = path.into();
        self
    }

    /// Check that `url` and `name` are present.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Validation`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ShelfError> {
        if self.url.trim().is_empty() {
            return Err(ShelfError::Validation("url"));
        }
        if self.name.trim().is_empty() {
            return Err(ShelfError::Validation("name"));
        }
        Ok(())
    }

    /// The preview path if it is set and the file still exists.
    ///
    /// Stale or missing previews are treated as absent.
    pub fn existing_preview(&self) -> Option<&Path> {
        if self.preview_path.is_empty() {
            return None;
        }
        let path = Path::new(&self.preview_path);
        path.is_file().then_some(path)
    }
}

/// File-backed catalog.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Location of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record in insertion order.
    ///
    /// A missing file is an empty catalog. An unreadable or malformed file
    /// is logged and also treated as empty, so a damaged catalog never
    /// blocks the browser from opening.
    pub fn load(&self) -> Vec<VideoRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(error) => {
                log::warn!("Ignoring unreadable catalog: {error}");
                Vec::new()
            }
        }
    }

    /// Load every record, reporting read and parse failures.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Persistence`] if the file exists but cannot be
    /// read or parsed.
    pub fn try_load(&self) -> Result<Vec<VideoRecord>, ShelfError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.persistence_error(error)),
        };
        serde_json::from_slice(&bytes).map_err(|error| self.persistence_error(error))
    }

    /// Append one record and rewrite the whole file.
    ///
    /// The record is not validated here; see [`save`](CatalogStore::save).
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Persistence`] if the file cannot be written.
    pub fn append(&self, record: &VideoRecord) -> Result<(), ShelfError> {
        let mut records = self.load();
        records.push(record.clone());

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| self.persistence_error(error))?;
        }
        let serialized =
            serde_json::to_vec(&records).map_err(|error| self.persistence_error(error))?;
        fs::write(&self.path, serialized).map_err(|error| self.persistence_error(error))?;

        log::info!(
            "Saved \"{}\" to {} ({} record(s))",
            record.name,
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    /// Validate and append a record.
    ///
    /// Returns `false` without touching the file if the record has an empty
    /// `url` or `name`, or if the write fails. Failures are logged rather
    /// than returned.
    pub fn save(&self, record: VideoRecord) -> bool {
        if let Err(error) = record.validate() {
            log::debug!("Not saving record: {error}");
            return false;
        }
        match self.append(&record) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("Dropped catalog write: {error}");
                false
            }
        }
    }

    fn persistence_error(&self, error: impl ToString) -> ShelfError {
        ShelfError::Persistence {
            path: self.path.clone(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VideoRecord;

    #[test]
    fn validation_names_missing_field() {
        let error = VideoRecord::new("", "name").validate().unwrap_err();
        assert!(error.to_string().contains("url"));
        let error = VideoRecord::new("rtsp://cam", "  ").validate().unwrap_err();
        assert!(error.to_string().contains("name"));
        assert!(VideoRecord::new("rtsp://cam", "Cam").validate().is_ok());
    }

    #[test]
    fn record_uses_preview_key_on_disk() {
        let record = VideoRecord::new("a.mp4", "A").with_preview_path("thumbnails/A.jpg");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"url":"a.mp4","name":"A","preview":"thumbnails/A.jpg"}"#
        );
    }

    #[test]
    fn missing_preview_key_defaults_to_empty() {
        let record: VideoRecord = serde_json::from_str(r#"{"url":"a.mp4","name":"A"}"#).unwrap();
        assert!(record.preview_path.is_empty());
        assert!(record.existing_preview().is_none());
    }
}
