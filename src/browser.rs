//! Grid view over the catalog.
//!
//! [`CatalogBrowser`] lays catalog records out as tiles in a fixed-width,
//! row-major grid. Each [`Tile`] owns copies of its record's URL, name, and
//! preview path taken when the browser is built, so activating a tile always
//! plays that tile's video regardless of what happens to the catalog
//! afterwards.

use std::path::PathBuf;

use crate::catalog::VideoRecord;

/// Number of columns in the start grid.
pub const GRID_COLUMNS: usize = 3;

/// One activatable grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Label shown on the tile.
    pub name: String,
    /// URL played when the tile is activated.
    pub url: String,
    /// Preview icon, present only if the file exists.
    pub preview: Option<PathBuf>,
    pub row: usize,
    pub column: usize,
}

/// The start surface: a grid of tiles, one per catalog record.
#[derive(Debug, Clone, Default)]
pub struct CatalogBrowser {
    tiles: Vec<Tile>,
    columns: usize,
}

impl CatalogBrowser {
    /// Build a browser over `records` using [`GRID_COLUMNS`] columns.
    pub fn new(records: &[VideoRecord]) -> Self {
        Self::with_columns(records, GRID_COLUMNS)
    }

    /// Build a browser with a custom column count (minimum 1).
    pub fn with_columns(records: &[VideoRecord], columns: usize) -> Self {
        let columns = columns.max(1);
        let tiles = records
            .iter()
            .enumerate()
            .map(|(index, record)| Tile {
                name: record.name.clone(),
                url: record.url.clone(),
                preview: record.existing_preview().map(|path| path.to_path_buf()),
                row: index / columns,
                column: index % columns,
            })
            .collect();
        Self { tiles, columns }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles grouped by grid row.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> + '_ {
        self.tiles.chunks(self.columns)
    }

    /// The URL to play for the tile at `index`, if there is one.
    pub fn activate(&self, index: usize) -> Option<&str> {
        let tile = self.tiles.get(index)?;
        log::debug!("Activated tile {index} ({}) -> {}", tile.name, tile.url);
        Some(tile.url.as_str())
    }

    /// Index of the first tile whose name matches, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.tiles
            .iter()
            .position(|tile| tile.name.eq_ignore_ascii_case(name))
    }
}
