//! Benchmarks for planning, reconciliation, and extraction.
//!
//! Run with: cargo bench
//!
//! The fixture benchmark needs `tests/fixtures/sample_video.mp4`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use image::DynamicImage;
use stillframe::{
    DecodeSource, DecodedFrame, ExtractOptions, ExtractedFrame, FfmpegLogLevel, SamplingPlan,
    SamplingRate, SourceProperties, StillframeError, TimeWindow, VideoFile,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// In-memory source that hands out clones of one small frame.
struct RepeatingSource {
    properties: SourceProperties,
    image: DynamicImage,
    position: u64,
}

impl RepeatingSource {
    fn new(total_frame_count: u64, reported_frame_rate: f64) -> Self {
        Self {
            properties: SourceProperties {
                total_frame_count,
                reported_frame_rate,
                width: 16,
                height: 9,
            },
            image: DynamicImage::new_rgb8(16, 9),
            position: 0,
        }
    }
}

impl DecodeSource for RepeatingSource {
    fn properties(&self) -> SourceProperties {
        self.properties
    }

    fn end_position(&mut self) -> Option<f64> {
        Some(self.properties.total_frame_count as f64 / self.properties.reported_frame_rate)
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
        self.position = frame_index;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<Option<DecodedFrame>, StillframeError> {
        if self.position >= self.properties.total_frame_count {
            return Ok(None);
        }
        let index = self.position;
        self.position += 1;
        Ok(Some(DecodedFrame {
            index,
            reported_time: Some(index as f64 / self.properties.reported_frame_rate),
            image: self.image.clone(),
        }))
    }
}

fn benchmark_plan_computation(criterion: &mut Criterion) {
    let window = TimeWindow::from_secs(12.5, Some(3600.0));

    criterion.bench_function("compute plan (1h at 29.97 fps)", |bencher| {
        bencher.iter(|| {
            SamplingPlan::compute(
                black_box(&window),
                SamplingRate::PerSecond(2.0),
                30000.0 / 1001.0,
                107_892,
            )
            .unwrap()
        });
    });

    let plan = SamplingPlan::compute(&window, SamplingRate::PerSecond(2.0), 30000.0 / 1001.0, 107_892)
        .unwrap();
    criterion.bench_function("enumerate selected indices", |bencher| {
        bencher.iter(|| plan.selected_indices().count());
    });
}

fn benchmark_reconcile(criterion: &mut Criterion) {
    criterion.bench_function("reconcile synthetic source", |bencher| {
        bencher.iter(|| {
            let mut source = RepeatingSource::new(9000, 30.0);
            stillframe::reconcile(&mut source)
        });
    });
}

fn benchmark_synthetic_extraction(criterion: &mut Criterion) {
    let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(2.0));
    let window = TimeWindow::from_secs(0.0, Some(60.0));

    criterion.bench_function("sample 60s at 2 fps (synthetic)", |bencher| {
        bencher.iter(|| {
            let mut source = RepeatingSource::new(1800, 30.0);
            let mut sink = |frame: &ExtractedFrame| -> Result<(), StillframeError> {
                black_box(frame.identity());
                Ok(())
            };
            stillframe::extract_to_sink(&mut source, &window, &mut sink, &options).unwrap()
        });
    });
}

fn benchmark_fixture_extraction(criterion: &mut Criterion) {
    stillframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(1.0));
    criterion.bench_function("decode first 2s at 1 fps (fixture)", |bencher| {
        bencher.iter(|| {
            let mut video = VideoFile::open(SAMPLE_VIDEO).unwrap();
            stillframe::extract(&mut video, &TimeWindow::from_secs(0.0, Some(2.0)), &options)
                .unwrap()
                .count()
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_plan_computation,
    benchmark_reconcile,
    benchmark_synthetic_extraction,
    benchmark_fixture_extraction,
);
criterion::criterion_main!(benches);
