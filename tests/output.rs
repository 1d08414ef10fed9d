//! Directory output tests.

use std::fs;
use std::time::Duration;

use image::{DynamicImage, Rgb, RgbImage};
use stillframe::{DirectoryWriter, ExtractedFrame, FrameSink, ImageOutputFormat};

fn frame(index: u64, seconds: f64) -> ExtractedFrame {
    ExtractedFrame {
        index,
        timestamp: Duration::from_secs_f64(seconds),
        image: DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([200, 40, 10]))),
    }
}

fn file_names(directory: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn creates_nested_output_directory() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("a").join("b");

    let writer = DirectoryWriter::create(&target, ImageOutputFormat::Png, None).unwrap();

    assert!(target.is_dir());
    assert_eq!(writer.directory(), target.as_path());
}

#[test]
fn files_are_named_by_identity() {
    let root = tempfile::tempdir().unwrap();
    let mut writer = DirectoryWriter::create(root.path(), ImageOutputFormat::Png, Some(1)).unwrap();

    writer.write_frame(&frame(42, 14.0)).unwrap();
    writer.write_frame(&frame(3, 0.1)).unwrap();

    assert_eq!(
        file_names(root.path()),
        vec!["frame_000003_0.100s.png", "frame_000042_14.000s.png"]
    );
}

#[test]
fn no_partial_files_remain() {
    let root = tempfile::tempdir().unwrap();
    let mut writer = DirectoryWriter::create(root.path(), ImageOutputFormat::Jpeg, Some(80)).unwrap();

    for index in 0..5 {
        writer.write_frame(&frame(index, index as f64 / 25.0)).unwrap();
    }

    let names = file_names(root.path());
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|name| name.ends_with(".jpg")));
    assert!(!names.iter().any(|name| name.ends_with(".part")));
}

#[test]
fn every_format_round_trips_dimensions() {
    for format in [
        ImageOutputFormat::Png,
        ImageOutputFormat::Jpeg,
        ImageOutputFormat::Bmp,
        ImageOutputFormat::Tiff,
    ] {
        let root = tempfile::tempdir().unwrap();
        let mut writer = DirectoryWriter::create(root.path(), format, None).unwrap();
        let written = frame(7, 0.28);
        writer.write_frame(&written).unwrap();

        let path = writer.path_for(&written.identity());
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6), "{format}");
    }
}

#[test]
fn png_pixels_survive_encoding() {
    let root = tempfile::tempdir().unwrap();
    let mut writer = DirectoryWriter::create(root.path(), ImageOutputFormat::Png, Some(9)).unwrap();
    let written = frame(1, 0.04);
    writer.write_frame(&written).unwrap();

    let decoded = image::open(writer.path_for(&written.identity()))
        .unwrap()
        .to_rgb8();
    assert_eq!(decoded.get_pixel(3, 2), &Rgb([200, 40, 10]));
}
