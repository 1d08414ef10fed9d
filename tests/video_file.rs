//! FFmpeg-backed source tests.
//!
//! Fixture tests need `tests/fixtures/sample_video.mp4` and return early
//! when it is missing.

use std::path::Path;

use stillframe::{
    CancellationToken, DecodeSource, ExtractOptions, SamplingRate, StillframeError, StopReason,
    TimeWindow, VideoFile, VideoProbe, check_supported_format,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn unsupported_extension_is_rejected_before_opening() {
    let result = VideoFile::open("tests/fixtures/does_not_exist.gif");
    match result {
        Err(StillframeError::UnsupportedFormat { extension, .. }) => {
            assert_eq!(extension, ".gif");
        }
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn missing_extension_is_unsupported() {
    assert!(matches!(
        check_supported_format("README"),
        Err(StillframeError::UnsupportedFormat { ref extension, .. }) if extension.is_empty()
    ));
}

#[test]
fn extension_check_is_case_insensitive() {
    for name in ["a.MP4", "b.Mkv", "c.webm", "d.AVI", "e.mov", "f.wmv", "g.flv"] {
        assert!(check_supported_format(name).is_ok(), "{name}");
    }
}

#[test]
fn missing_file_is_unavailable() {
    let result = VideoFile::open("tests/fixtures/definitely_missing.mp4");
    assert!(matches!(
        result,
        Err(StillframeError::SourceUnavailable { .. })
    ));
}

#[test]
fn garbage_file_is_unavailable() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("garbage.mp4");
    std::fs::write(&path, b"this is not a video container").unwrap();

    assert!(matches!(
        VideoFile::open(&path),
        Err(StillframeError::SourceUnavailable { .. })
    ));
}

#[test]
fn fixture_properties_are_reported() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let video = VideoFile::open(path).expect("Failed to open fixture");
    let properties = video.properties();
    assert!(properties.width > 0 && properties.height > 0);
    assert!(properties.reported_frame_rate > 0.0);
}

#[test]
fn fixture_duration_is_determinable() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let info = VideoProbe::probe(path).expect("Failed to probe fixture");
    assert!(info.duration.is_determinable());
    assert!(!info.duration.candidate_methods.is_empty());
    assert!(info.size_bytes > 0);
    assert_eq!(info.file_name, "sample_video.mp4");
}

#[test]
fn fixture_extracts_one_frame_per_second() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(1.0));
    let window = TimeWindow::from_secs(0.0, Some(2.0));

    let report = stillframe::extract_frames(path, directory.path(), &window, &options)
        .expect("Failed to extract");

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.frames_written, report.plan.selected_count());
    assert!(report.frames_written >= 2);
    let written = std::fs::read_dir(directory.path()).unwrap().count() as u64;
    assert_eq!(written, report.frames_written);
}

#[test]
fn fixture_extraction_is_idempotent() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let window = TimeWindow::from_secs(0.5, Some(1.5));
    let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(4.0));
    let mut video = VideoFile::open(path).expect("Failed to open fixture");

    let first: Vec<String> = stillframe::extract(&mut video, &window, &options)
        .unwrap()
        .map(|frame| frame.unwrap().identity())
        .collect();
    let second: Vec<String> = stillframe::extract(&mut video, &window, &options)
        .unwrap()
        .map(|frame| frame.unwrap().identity())
        .collect();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn fixture_cancelled_before_start_writes_nothing() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let options = ExtractOptions::new().with_cancellation(token);

    let report =
        stillframe::extract_frames(path, directory.path(), &TimeWindow::full(), &options)
            .expect("Cancellation is not an error");

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.frames_written, 0);
}
