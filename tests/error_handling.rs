//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for sources that
//! cannot be decoded. Fixture tests require `tests/fixtures/sample_video.mp4`.

use std::path::Path;

use vidshelf::{
    DecodeSession, FfmpegSession, Frame, PixelLayout, ShelfError, SourceProbe, SubprocessSession,
};

#[test]
fn open_nonexistent_file() {
    let result = FfmpegSession::open("this_file_does_not_exist.mp4");
    match result {
        Err(ShelfError::SourceUnavailable { url, .. }) => {
            assert_eq!(url, "this_file_does_not_exist.mp4");
        }
        Err(other) => panic!("expected SourceUnavailable, got {other}"),
        Ok(_) => panic!("expected an error for a missing file"),
    }
}

#[test]
fn open_invalid_file() {
    // Create a temporary file with garbage content.
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = FfmpegSession::open(&invalid_file_path.to_string_lossy());
    assert!(result.is_err(), "Expected error for invalid media file");
}

#[test]
fn probe_nonexistent_file() {
    let error = SourceProbe::probe("this_file_does_not_exist.mp4").unwrap_err();
    let message = error.to_string();
    assert!(
        message.contains("Source unavailable"),
        "Error message should mention the source: {message}",
    );
}

#[test]
fn subprocess_session_requires_probe() {
    let result = SubprocessSession::open("ffmpeg", "this_file_does_not_exist.mp4");
    assert!(matches!(result, Err(ShelfError::SourceUnavailable { .. })));
}

#[test]
fn mismatched_frame_buffer() {
    let error = Frame::new(4, 4, PixelLayout::Rgb24, vec![0; 10]).unwrap_err();
    assert!(matches!(
        error,
        ShelfError::InvalidFrame {
            width: 4,
            height: 4,
            expected: 48,
            actual: 10,
        }
    ));
}

#[test]
fn validation_message_names_field() {
    let error = vidshelf::VideoRecord::new("", "Clip").validate().unwrap_err();
    assert_eq!(error.to_string(), "Invalid video record: url must not be empty");
}

#[test]
fn fixture_session_reads_and_rewinds() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let mut session = FfmpegSession::open(path).expect("Failed to open test video");
    let (width, height) = session.dimensions();
    assert!(session.frame_rate() > 0.0);

    let first = session
        .next_frame()
        .expect("read succeeds")
        .expect("first frame present");
    assert_eq!((first.width(), first.height()), (width, height));
    assert_eq!(first.layout(), PixelLayout::Rgb24);

    while session.next_frame().expect("read succeeds").is_some() {}
    assert!(session.next_frame().expect("read after end").is_none());

    session.seek_to_start().expect("rewind succeeds");
    let again = session
        .next_frame()
        .expect("read succeeds")
        .expect("first frame after rewind");
    assert_eq!(again.data(), first.data());

    session.release();
}

#[test]
fn fixture_probe() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let info = SourceProbe::probe(path).expect("Failed to probe test video");
    assert!(info.width > 0 && info.height > 0);
    assert!(info.frames_per_second > 0.0);
    assert!(!info.codec.is_empty());
}
