//! Synthetic in-memory video source shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use stillframe::{DecodeSource, DecodedFrame, SourceProperties, StillframeError};

pub const FRAME_WIDTH: u32 = 4;
pub const FRAME_HEIGHT: u32 = 2;

/// A decodable stream of tiny solid-colour frames.
///
/// The reported properties, the number of frames that actually decode, and
/// the timestamps the decoder reports are all configurable independently, so
/// tests can model containers that misreport themselves.
pub struct SyntheticSource {
    properties: SourceProperties,
    end_position: Option<f64>,
    decodable_frames: u64,
    seconds_per_frame: Option<f64>,
    fail_at: Option<u64>,
    keyframe_interval: u64,
    position: u64,
    /// Every frame index passed to `seek`, in order.
    pub seeks: Vec<u64>,
    /// Number of frames successfully decoded.
    pub decoded: u64,
}

impl SyntheticSource {
    /// `total_frames` frames at `frames_per_second`, reported accurately.
    pub fn new(total_frames: u64, frames_per_second: f64) -> Self {
        Self {
            properties: SourceProperties {
                total_frame_count: total_frames,
                reported_frame_rate: frames_per_second,
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
            },
            end_position: None,
            decodable_frames: total_frames,
            seconds_per_frame: (frames_per_second > 0.0).then(|| 1.0 / frames_per_second),
            fail_at: None,
            keyframe_interval: 1,
            position: 0,
            seeks: Vec::new(),
            decoded: 0,
        }
    }

    /// What an end seek reports.
    pub fn with_end_position(mut self, seconds: Option<f64>) -> Self {
        self.end_position = seconds;
        self
    }

    /// Frame count the container claims, independent of what decodes.
    pub fn with_reported_frame_count(mut self, total_frames: u64) -> Self {
        self.properties.total_frame_count = total_frames;
        self
    }

    /// Number of frames that actually decode.
    pub fn with_decodable_frames(mut self, frames: u64) -> Self {
        self.decodable_frames = frames;
        self
    }

    /// Spacing of decoder timestamps; `None` reports no timestamps at all.
    pub fn with_seconds_per_frame(mut self, seconds: Option<f64>) -> Self {
        self.seconds_per_frame = seconds;
        self
    }

    /// Decoding frame `index` fails.
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Seeks land on the preceding multiple of `interval`.
    pub fn with_keyframe_interval(mut self, interval: u64) -> Self {
        self.keyframe_interval = interval.max(1);
        self
    }

    /// Red channel of frame `index`, used to check which frame was written.
    pub fn marker(index: u64) -> u8 {
        (index % 256) as u8
    }
}

impl DecodeSource for SyntheticSource {
    fn properties(&self) -> SourceProperties {
        self.properties
    }

    fn end_position(&mut self) -> Option<f64> {
        self.position = self.decodable_frames;
        self.end_position
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
        self.seeks.push(frame_index);
        self.position = frame_index - frame_index % self.keyframe_interval;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<Option<DecodedFrame>, StillframeError> {
        let index = self.position;
        if index >= self.decodable_frames {
            return Ok(None);
        }
        if self.fail_at == Some(index) {
            return Err(StillframeError::VideoDecodeError(format!(
                "corrupt packet at frame {index}"
            )));
        }

        self.position += 1;
        self.decoded += 1;
        let image = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgb([Self::marker(index), 0, 0]));

        Ok(Some(DecodedFrame {
            index,
            reported_time: self.seconds_per_frame.map(|step| index as f64 * step),
            image: DynamicImage::ImageRgb8(image),
        }))
    }
}
