//! Extracted frames and their identities.

use std::time::Duration;

use image::DynamicImage;

/// A decoded frame selected by a [`SamplingPlan`](crate::SamplingPlan).
///
/// Produced one at a time by [`FrameSampler`](crate::FrameSampler) and handed
/// to a [`FrameSink`](crate::FrameSink); nothing keeps frames around after
/// they are written.
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    /// Absolute, zero-based frame index in the stream.
    pub index: u64,
    /// `index / frame_rate`.
    pub timestamp: Duration,
    /// The decoded raster.
    pub image: DynamicImage,
}

impl ExtractedFrame {
    pub(crate) fn new(index: u64, frame_rate: f64, image: DynamicImage) -> Self {
        Self {
            index,
            timestamp: Duration::from_secs_f64(index as f64 / frame_rate),
            image,
        }
    }

    /// Stable name for this frame, e.g. `frame_000042_14.000s`.
    ///
    /// Embeds the zero-padded index and the timestamp with three decimals,
    /// so identities from one run never collide and sort in time order.
    pub fn identity(&self) -> String {
        frame_identity(self.index, self.timestamp)
    }
}

/// Format the identity for a frame index and timestamp.
pub fn frame_identity(index: u64, timestamp: Duration) -> String {
    format!("frame_{index:06}_{:.3}s", timestamp.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_embeds_index_and_timestamp() {
        assert_eq!(
            frame_identity(42, Duration::from_secs(14)),
            "frame_000042_14.000s"
        );
        let frame = ExtractedFrame::new(7, 3.0, DynamicImage::new_rgb8(1, 1));
        assert_eq!(frame.identity(), "frame_000007_2.333s");
    }

    #[test]
    fn identities_sort_in_time_order() {
        let mut names: Vec<String> = [120_u64, 3, 45, 1000]
            .iter()
            .map(|&index| frame_identity(index, Duration::from_secs_f64(index as f64 / 30.0)))
            .collect();
        names.sort();
        assert_eq!(names[0], "frame_000003_0.100s");
        assert_eq!(names[3], "frame_001000_33.333s");
    }
}
