//! PreviewGenerator tests.
//!
//! Most tests drive the generator with in-memory sessions; the fixture test
//! at the end requires `tests/fixtures/sample_video.mp4`.

use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use vidshelf::{
    DecodeSession, FfmpegOpener, Frame, PixelLayout, PreviewGenerator, PreviewOutcome,
    SessionOpener, ShelfError, VideoRecord,
};

struct OneShotSession {
    frame: Option<Frame>,
    released: Arc<AtomicUsize>,
}

impl DecodeSession for OneShotSession {
    fn frame_rate(&self) -> f64 {
        25.0
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ShelfError> {
        Ok(self.frame.take())
    }

    fn seek_to_start(&mut self) -> Result<(), ShelfError> {
        Ok(())
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct FailingSession {
    released: Arc<AtomicUsize>,
}

impl DecodeSession for FailingSession {
    fn frame_rate(&self) -> f64 {
        0.0
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ShelfError> {
        Err(ShelfError::FrameRead("corrupt packet".to_string()))
    }

    fn seek_to_start(&mut self) -> Result<(), ShelfError> {
        Ok(())
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A 4x2 BGR frame: left half blue, right half red.
fn sample_frame() -> Frame {
    let mut data = Vec::new();
    for _row in 0..2 {
        for column in 0..4 {
            if column < 2 {
                data.extend_from_slice(&[255, 0, 0]);
            } else {
                data.extend_from_slice(&[0, 0, 255]);
            }
        }
    }
    Frame::new(4, 2, PixelLayout::Bgr24, data).expect("valid frame")
}

fn frame_opener(with_frame: bool, released: &Arc<AtomicUsize>) -> Arc<dyn SessionOpener> {
    let released = Arc::clone(released);
    Arc::new(
        move |_url: &str| -> Result<Box<dyn DecodeSession>, ShelfError> {
            Ok(Box::new(OneShotSession {
                frame: with_frame.then(sample_frame),
                released: Arc::clone(&released),
            }))
        },
    )
}

#[test]
fn saves_first_frame_at_destination() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let released = Arc::new(AtomicUsize::new(0));
    let generator = PreviewGenerator::new(
        directory.path().join("thumbnails"),
        "png",
        frame_opener(true, &released),
    );

    let destination = generator.path_for("Clip A");
    assert_eq!(destination, directory.path().join("thumbnails").join("Clip A.png"));

    let outcome = generator.generate("stub://clip", &destination);
    assert_eq!(outcome, PreviewOutcome::Saved(destination.clone()));
    assert!(outcome.is_saved());
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let image = image::open(&destination).expect("preview decodes").to_rgb8();
    assert_eq!(image.dimensions(), (4, 2));
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255]);
    assert_eq!(image.get_pixel(3, 1).0, [255, 0, 0]);
}

#[test]
fn names_cannot_escape_thumbnail_directory() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let thumbnails = directory.path().join("thumbnails");
    let released = Arc::new(AtomicUsize::new(0));
    let generator = PreviewGenerator::new(&thumbnails, "png", frame_opener(true, &released));

    for name in ["../outside", "nested/name", "back\\slash", ".."] {
        let destination = generator.path_for(name);
        assert_eq!(destination.parent(), Some(thumbnails.as_path()), "{name}");
        assert!(generator.generate("stub://clip", &destination).is_saved());
    }
    assert!(!directory.path().join("outside.png").exists());
    assert_eq!(fs::read_dir(&thumbnails).expect("thumbnails listed").count(), 4);
}

#[test]
fn jpeg_preview_keeps_frame_dimensions() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let released = Arc::new(AtomicUsize::new(0));
    let generator = PreviewGenerator::new(directory.path(), "jpg", frame_opener(true, &released));

    let destination = generator.path_for("Clip");
    assert!(generator.generate("stub://clip", &destination).is_saved());
    let image = image::open(&destination).expect("preview decodes");
    assert_eq!((image.width(), image.height()), (4, 2));
}

#[test]
fn no_frame_means_unavailable_and_no_file() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let released = Arc::new(AtomicUsize::new(0));
    let generator = PreviewGenerator::new(directory.path(), "jpg", frame_opener(false, &released));

    let destination = generator.path_for("Empty");
    assert_eq!(
        generator.generate("stub://empty", &destination),
        PreviewOutcome::Unavailable
    );
    assert!(!destination.exists());
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn read_error_means_unavailable_and_session_released() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let released = Arc::new(AtomicUsize::new(0));
    let session_released = Arc::clone(&released);
    let opener: Arc<dyn SessionOpener> = Arc::new(
        move |_url: &str| -> Result<Box<dyn DecodeSession>, ShelfError> {
            Ok(Box::new(FailingSession {
                released: Arc::clone(&session_released),
            }))
        },
    );
    let generator = PreviewGenerator::new(directory.path(), "jpg", opener);

    let destination = generator.path_for("Broken");
    assert!(!generator.generate("stub://broken", &destination).is_saved());
    assert!(!destination.exists());
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn open_error_means_unavailable() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let opener: Arc<dyn SessionOpener> = Arc::new(
        |url: &str| -> Result<Box<dyn DecodeSession>, ShelfError> {
            Err(ShelfError::SourceUnavailable {
                url: url.to_string(),
                reason: "404".to_string(),
            })
        },
    );
    let generator = PreviewGenerator::new(directory.path(), "jpg", opener);

    let destination = generator.path_for("Missing");
    assert_eq!(
        generator.generate("https://example.com/missing.mp4", &destination),
        PreviewOutcome::Unavailable
    );
    assert!(!destination.exists());
}

#[test]
fn creates_thumbnail_directory() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let thumbnails = directory.path().join("nested").join("thumbnails");
    let generator = PreviewGenerator::new(&thumbnails, ".JPG", Arc::new(FfmpegOpener));
    assert!(thumbnails.is_dir());
    assert_eq!(generator.directory(), thumbnails.as_path());
}

#[test]
fn display_thumbnail_fits_box() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("wide.png");
    image::RgbImage::new(400, 100).save(&path).expect("write image");

    let shown = PreviewGenerator::display_thumbnail(&path).expect("decodes");
    assert_eq!((shown.width(), shown.height()), (200, 50));

    let path = directory.path().join("tall.png");
    image::RgbImage::new(60, 300).save(&path).expect("write image");
    let shown = PreviewGenerator::display_thumbnail(&path).expect("decodes");
    assert_eq!((shown.width(), shown.height()), (30, 150));
}

#[test]
fn refresh_rewrites_only_stale_previews() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let released = Arc::new(AtomicUsize::new(0));
    let generator = PreviewGenerator::new(directory.path(), "png", frame_opener(true, &released));

    let present = directory.path().join("Present.png");
    fs::write(&present, b"kept").expect("write existing preview");
    let stale = directory.path().join("gone").join("Stale.png");

    let records = vec![
        VideoRecord::new("a.mp4", "Present").with_preview_path(present.to_string_lossy()),
        VideoRecord::new("b.mp4", "Stale").with_preview_path(stale.to_string_lossy()),
        VideoRecord::new("c.mp4", "NoPreview"),
    ];

    let results = generator.refresh_stale(&records);
    assert_eq!(results, vec![("Stale".to_string(), PreviewOutcome::Saved(stale.clone()))]);
    assert!(stale.is_file());
    assert_eq!(fs::read(&present).expect("existing preview"), b"kept");
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn first_frame_of_fixture() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let generator = PreviewGenerator::new(directory.path(), "jpg", Arc::new(FfmpegOpener));
    let destination = generator.path_for("Sample");
    assert!(generator.generate(path, &destination).is_saved());
    assert!(image::open(&destination).is_ok());
}
