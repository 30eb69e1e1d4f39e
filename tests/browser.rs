//! CatalogBrowser grid layout and activation tests.

use std::fs;

use vidshelf::{CatalogBrowser, GRID_COLUMNS, VideoRecord};

fn records(count: usize) -> Vec<VideoRecord> {
    (0..count)
        .map(|index| VideoRecord::new(format!("video-{index}.mp4"), format!("Video {index}")))
        .collect()
}

#[test]
fn tiles_fill_three_columns_row_major() {
    let browser = CatalogBrowser::new(&records(7));
    assert_eq!(browser.columns(), GRID_COLUMNS);
    assert_eq!(browser.len(), 7);

    let positions: Vec<(usize, usize)> = browser
        .tiles()
        .iter()
        .map(|tile| (tile.row, tile.column))
        .collect();
    assert_eq!(
        positions,
        vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (2, 0)]
    );

    let row_lengths: Vec<usize> = browser.rows().map(<[_]>::len).collect();
    assert_eq!(row_lengths, vec![3, 3, 1]);
}

#[test]
fn empty_catalog_has_no_tiles() {
    let browser = CatalogBrowser::new(&[]);
    assert!(browser.is_empty());
    assert_eq!(browser.rows().count(), 0);
    assert_eq!(browser.activate(0), None);
}

#[test]
fn each_tile_plays_its_own_url() {
    let mut source = records(5);
    let browser = CatalogBrowser::new(&source);

    // Later changes to the records do not reach tiles already built.
    source[1].url = "changed.mp4".to_string();
    source.clear();

    for index in 0..5 {
        assert_eq!(browser.activate(index), Some(format!("video-{index}.mp4").as_str()));
    }
    assert_eq!(browser.activate(5), None);
}

#[test]
fn custom_column_count() {
    let browser = CatalogBrowser::with_columns(&records(5), 2);
    let last = &browser.tiles()[4];
    assert_eq!((last.row, last.column), (2, 0));

    let single = CatalogBrowser::with_columns(&records(2), 0);
    assert_eq!(single.columns(), 1);
    assert_eq!(single.tiles()[1].row, 1);
}

#[test]
fn preview_icon_only_when_file_exists() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let present = directory.path().join("A.jpg");
    fs::write(&present, b"jpeg").expect("write thumbnail");
    let missing = directory.path().join("B.jpg");

    let records = vec![
        VideoRecord::new("a.mp4", "A").with_preview_path(present.to_string_lossy()),
        VideoRecord::new("b.mp4", "B").with_preview_path(missing.to_string_lossy()),
        VideoRecord::new("c.mp4", "C"),
    ];
    let browser = CatalogBrowser::new(&records);

    assert_eq!(browser.tiles()[0].preview.as_deref(), Some(present.as_path()));
    assert_eq!(browser.tiles()[1].preview, None);
    assert_eq!(browser.tiles()[2].preview, None);
}

#[test]
fn find_ignores_ascii_case() {
    let browser = CatalogBrowser::new(&records(3));
    assert_eq!(browser.find("video 2"), Some(2));
    assert_eq!(browser.find("VIDEO 0"), Some(0));
    assert_eq!(browser.find("Video 9"), None);
}
