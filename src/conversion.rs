//! Internal conversions between FFmpeg and crate types.
//!
//! Pixel-plane copying for RGB24 frames and timestamp arithmetic between
//! stream time bases, seconds, and frame indices.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use ffmpeg_sys_next::AV_TIME_BASE;
use image::RgbImage;

use crate::error::StillframeError;

/// Copy a scaled RGB24 frame into an [`RgbImage`], dropping row padding.
pub(crate) fn rgb_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<RgbImage, StillframeError> {
    let stride = rgb_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let rows = height as usize;
    let data = rgb_frame.data(0);

    if stride < row_bytes || data.len() < stride * rows.saturating_sub(1) + row_bytes {
        return Err(StillframeError::VideoDecodeError(format!(
            "RGB plane too small for {width}x{height} (stride {stride}, {} bytes)",
            data.len()
        )));
    }

    let buffer = if stride == row_bytes {
        data[..row_bytes * rows].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * rows);
        for row in 0..rows {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    };

    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        StillframeError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}

/// Rescale a PTS value from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    let denominator = time_base.denominator();
    if denominator == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / denominator as f64
}

/// Nearest frame index for a time in seconds.
///
/// Rounds rather than truncates: PTS values for rates such as 30000/1001
/// land a hair below the exact frame time.
pub(crate) fn seconds_to_nearest_frame(seconds: f64, frames_per_second: f64) -> u64 {
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Absolute index for a decoded frame, never behind `next_index`.
///
/// The first frame after a seek takes its timestamp-derived index as is,
/// since a keyframe seek may land before the requested frame. Later frames
/// advance by at least one, so jittery or variable-rate timestamps that
/// round to the same index still get distinct, increasing indices.
pub(crate) fn monotonic_frame_index(
    derived_index: Option<u64>,
    next_index: u64,
    first_after_seek: bool,
) -> u64 {
    match derived_index {
        Some(index) if first_after_seek => index,
        Some(index) => index.max(next_index),
        None => next_index,
    }
}

/// Seek target for a frame index, in `AV_TIME_BASE` units (microseconds),
/// as expected by `Input::seek` with no stream selected.
pub(crate) fn frame_index_to_seek_timestamp(frame_index: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_index as f64 / frames_per_second;
    (seconds * AV_TIME_BASE as f64) as i64
}

/// Convert an `AV_TIME_BASE` duration (container `duration()`) to seconds.
pub(crate) fn container_duration_to_seconds(duration: i64) -> f64 {
    duration as f64 / AV_TIME_BASE as f64
}

/// `numerator / denominator`, or `0.0` for an unset rational.
pub(crate) fn rational_to_f64(rational: Rational) -> f64 {
    if rational.numerator() > 0 && rational.denominator() > 0 {
        rational.numerator() as f64 / rational.denominator() as f64
    } else {
        0.0
    }
}
