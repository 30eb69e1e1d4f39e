//! Benchmarks for frame conversion, previews, and catalog persistence.
//!
//! Run with: cargo bench
//!
//! The decode benchmark requires `tests/fixtures/sample_video.mp4`.

use std::{hint::black_box, path::Path, sync::Arc, time::Duration};

use criterion::{BatchSize, Criterion};
use ffmpeg_next::util::log::Level as LogLevel;
use vidshelf::{
    CatalogBrowser, CatalogStore, DecodeSession, FfmpegOpener, FfmpegSession, Frame, PixelLayout,
    PreviewGenerator, VideoRecord, paced_delay,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn hd_frame(layout: PixelLayout) -> Frame {
    Frame::new(1280, 720, layout, vec![96; 1280 * 720 * 3]).unwrap()
}

fn benchmark_frame_conversion(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("frame conversion (1280x720)");

    group.bench_function("bgr24 -> rgb24", |bencher| {
        bencher.iter_batched(
            || hd_frame(PixelLayout::Bgr24),
            |frame| black_box(frame.into_rgb()),
            BatchSize::LargeInput,
        );
    });

    group.bench_function("rgb24 passthrough", |bencher| {
        bencher.iter_batched(
            || hd_frame(PixelLayout::Rgb24),
            |frame| black_box(frame.into_rgb()),
            BatchSize::LargeInput,
        );
    });

    group.bench_function("into image", |bencher| {
        bencher.iter_batched(
            || hd_frame(PixelLayout::Bgr24),
            |frame| black_box(frame.into_image().unwrap()),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn benchmark_pacing(criterion: &mut Criterion) {
    criterion.bench_function("paced delay", |bencher| {
        let native = Duration::from_secs_f64(1.0 / 29.97);
        bencher.iter(|| paced_delay(black_box(native), black_box(1.75)));
    });
}

fn benchmark_catalog(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("catalog");
    group.sample_size(20);

    group.bench_function("append to 100 records", |bencher| {
        bencher.iter_batched(
            || {
                let directory = tempfile::tempdir().unwrap();
                let store = CatalogStore::new(directory.path().join("videos.json"));
                for index in 0..100 {
                    store
                        .append(&VideoRecord::new(format!("{index}.mp4"), format!("Video {index}")))
                        .unwrap();
                }
                (directory, store)
            },
            |(_directory, store)| {
                store
                    .append(&VideoRecord::new("new.mp4", "New"))
                    .unwrap();
            },
            BatchSize::PerIteration,
        );
    });

    let directory = tempfile::tempdir().unwrap();
    let store = CatalogStore::new(directory.path().join("videos.json"));
    for index in 0..500 {
        store
            .append(&VideoRecord::new(format!("{index}.mp4"), format!("Video {index}")))
            .unwrap();
    }

    group.bench_function("load 500 records and lay out grid", |bencher| {
        bencher.iter(|| black_box(CatalogBrowser::new(&store.load())));
    });

    group.finish();
}

fn benchmark_decode(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("decode");
    group.sample_size(10);

    group.bench_function("first frame", |bencher| {
        bencher.iter(|| {
            let mut session = FfmpegSession::open(SAMPLE_VIDEO).unwrap();
            let frame = session.next_frame().unwrap();
            session.release();
            black_box(frame)
        });
    });

    group.bench_function("preview to jpeg", |bencher| {
        let directory = tempfile::tempdir().unwrap();
        let generator = PreviewGenerator::new(directory.path(), "jpg", Arc::new(FfmpegOpener));
        let destination = generator.path_for("Sample");
        bencher.iter(|| black_box(generator.generate(SAMPLE_VIDEO, &destination)));
    });

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_frame_conversion,
    benchmark_pacing,
    benchmark_catalog,
    benchmark_decode,
);
criterion::criterion_main!(benches);
