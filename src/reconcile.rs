//! Duration reconciliation.
//!
//! Containers frequently disagree with themselves about how long a video is:
//! the header duration, the frame count over the frame rate, and the
//! timestamp of the last frame can all differ. [`reconcile`] runs every
//! measurement that the source supports, discards degenerate results, and
//! keeps the largest remaining value, since under-reporting is far more
//! common than over-reporting.
//!
//! # Example
//!
//! ```no_run
//! use stillframe::{StillframeError, VideoFile, reconcile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let estimate = reconcile(&mut video);
//! for (method, seconds) in &estimate.candidate_methods {
//!     println!("{method}: {seconds:.3}s");
//! }
//! println!("chosen: {:.3}s", estimate.seconds);
//! # Ok::<(), StillframeError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::source::{DecodeSource, DecodedFrame, SourceProperties};

/// Upper bound on accepted samples (and on visited frames) for
/// [`DurationMethod::SampledScan`].
pub const MAX_SCAN_SAMPLES: u64 = 300;

/// Relative spread between candidates above which they are considered to
/// disagree.
pub const DISAGREEMENT_TOLERANCE: f64 = 0.05;

/// One strategy for measuring the duration of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationMethod {
    /// Seek to the logical end of the stream and read the elapsed time there.
    EndSeek,
    /// `total_frame_count / reported_frame_rate`.
    FramesOverRate,
    /// Decode the last frame and read its presentation time.
    LastDecodedFrame,
    /// Decode up to [`MAX_SCAN_SAMPLES`] evenly spaced frames and keep the
    /// largest increasing timestamp. When the frame count is unknown the
    /// first frames are read in order instead. Only tried when every other
    /// method degenerates.
    SampledScan,
}

impl DurationMethod {
    /// Methods tried unconditionally, in order.
    const PRIMARY: [DurationMethod; 3] = [
        DurationMethod::EndSeek,
        DurationMethod::FramesOverRate,
        DurationMethod::LastDecodedFrame,
    ];

    /// Short machine-friendly name.
    pub fn name(self) -> &'static str {
        match self {
            DurationMethod::EndSeek => "end_seek",
            DurationMethod::FramesOverRate => "frames_over_rate",
            DurationMethod::LastDecodedFrame => "last_decoded_frame",
            DurationMethod::SampledScan => "sampled_scan",
        }
    }

    /// Run this method against `source`. `None` when the method is not
    /// structurally available or produced nothing.
    fn measure<S: DecodeSource + ?Sized>(
        self,
        source: &mut S,
        properties: &SourceProperties,
    ) -> Option<f64> {
        match self {
            DurationMethod::EndSeek => source.end_position(),
            DurationMethod::FramesOverRate => {
                if properties.total_frame_count > 0 && properties.reported_frame_rate > 0.0 {
                    Some(properties.total_frame_count as f64 / properties.reported_frame_rate)
                } else {
                    None
                }
            }
            DurationMethod::LastDecodedFrame => last_decoded_frame_time(source, properties),
            DurationMethod::SampledScan => sampled_scan(source, properties),
        }
    }
}

impl Display for DurationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// The reconciled duration of a stream.
///
/// `seconds` is the maximum of `candidate_methods`, or `0.0` when every
/// method degenerated. Callers that need a positive duration must check
/// [`is_determinable`](DurationEstimate::is_determinable) first.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct DurationEstimate {
    /// Chosen duration in seconds.
    pub seconds: f64,
    /// Frame rate as reported by the container. Not reconciled.
    pub frame_rate: f64,
    /// Every method that produced a usable value, in the order they ran.
    pub candidate_methods: Vec<(DurationMethod, f64)>,
}

impl DurationEstimate {
    pub(crate) fn from_candidates(
        frame_rate: f64,
        candidate_methods: Vec<(DurationMethod, f64)>,
    ) -> Self {
        let seconds = candidate_methods
            .iter()
            .map(|&(_, value)| value)
            .fold(0.0_f64, f64::max);

        Self {
            seconds,
            frame_rate,
            candidate_methods,
        }
    }

    /// `true` when at least one method produced a positive duration.
    pub fn is_determinable(&self) -> bool {
        self.seconds > 0.0
    }

    /// The chosen duration, or `None` when undeterminable.
    pub fn duration(&self) -> Option<Duration> {
        if self.is_determinable() {
            Duration::try_from_secs_f64(self.seconds).ok()
        } else {
            None
        }
    }

    /// Difference between the largest and smallest candidate, in seconds.
    pub fn spread(&self) -> f64 {
        let min = self
            .candidate_methods
            .iter()
            .map(|&(_, value)| value)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            self.seconds - min
        } else {
            0.0
        }
    }

    /// `true` when candidates differ by more than [`DISAGREEMENT_TOLERANCE`]
    /// of the chosen duration.
    pub fn has_disagreement(&self) -> bool {
        self.is_determinable() && self.spread() > self.seconds * DISAGREEMENT_TOLERANCE
    }

    /// Value reported by `method`, if it produced one.
    pub fn candidate(&self, method: DurationMethod) -> Option<f64> {
        self.candidate_methods
            .iter()
            .find(|&&(m, _)| m == method)
            .map(|&(_, value)| value)
    }
}

/// Produce a best-estimate duration for `source`.
///
/// Runs [`DurationMethod::EndSeek`], [`DurationMethod::FramesOverRate`] and
/// [`DurationMethod::LastDecodedFrame`], skipping results that are not
/// positive. If all three degenerate and the container reports a positive
/// frame rate, falls back to [`DurationMethod::SampledScan`]. The maximum
/// surviving value wins.
///
/// Never fails: an undeterminable duration is returned as `seconds == 0.0`.
/// The decoder is repositioned at frame 0 afterwards on a best-effort basis.
pub fn reconcile<S: DecodeSource + ?Sized>(source: &mut S) -> DurationEstimate {
    let properties = source.properties();
    let mut candidates = Vec::with_capacity(DurationMethod::PRIMARY.len());

    for method in DurationMethod::PRIMARY {
        record(method, method.measure(source, &properties), &mut candidates);
    }

    if candidates.is_empty() && properties.reported_frame_rate > 0.0 {
        log::warn!("All duration probes degenerated; falling back to a sampled scan");
        let method = DurationMethod::SampledScan;
        record(method, method.measure(source, &properties), &mut candidates);
    }

    if let Err(error) = source.seek(0) {
        log::debug!("Could not rewind after duration probing: {error}");
    }

    let estimate = DurationEstimate::from_candidates(properties.reported_frame_rate, candidates);

    if estimate.has_disagreement() {
        log::warn!(
            "Duration candidates disagree by {:.3}s; using {:.3}s",
            estimate.spread(),
            estimate.seconds,
        );
    }

    log::debug!(
        "Reconciled duration: {:.3}s from {} candidate(s) at {:.3} fps",
        estimate.seconds,
        estimate.candidate_methods.len(),
        estimate.frame_rate,
    );

    estimate
}

fn record(
    method: DurationMethod,
    value: Option<f64>,
    candidates: &mut Vec<(DurationMethod, f64)>,
) {
    match value {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => {
            log::debug!("Duration candidate {method}: {seconds:.3}s");
            candidates.push((method, seconds));
        }
        Some(seconds) => log::debug!("Duration candidate {method} degenerate: {seconds}"),
        None => log::debug!("Duration candidate {method} unavailable"),
    }
}

fn last_decoded_frame_time<S: DecodeSource + ?Sized>(
    source: &mut S,
    properties: &SourceProperties,
) -> Option<f64> {
    let target = properties.total_frame_count.checked_sub(1)?;
    source.seek(target).ok()?;

    // The seek may land on an earlier keyframe; decode up to the target.
    let mut latest = None;
    while let Ok(Some(frame)) = source.decode_next() {
        if frame.reported_time.is_some() {
            latest = frame.reported_time;
        }
        if frame.index >= target {
            break;
        }
    }
    latest
}

fn sampled_scan<S: DecodeSource + ?Sized>(
    source: &mut S,
    properties: &SourceProperties,
) -> Option<f64> {
    let total = properties.total_frame_count;
    let mut tracker = ScanTracker::default();

    if total == 0 {
        // Unknown length: read the first frames in order instead of seeking.
        source.seek(0).ok()?;
        for _ in 0..MAX_SCAN_SAMPLES {
            match source.decode_next() {
                Ok(Some(frame)) => tracker.observe(frame.reported_time),
                _ => break,
            }
        }
        return tracker.result();
    }

    let stride = total.div_ceil(MAX_SCAN_SAMPLES).max(1);
    let mut index = 0_u64;
    while index < total && tracker.accepted < MAX_SCAN_SAMPLES {
        match decode_at(source, index) {
            Some(frame) => tracker.observe(frame.reported_time),
            None => break,
        }
        index += stride;
    }

    tracker.result()
}

/// Seek to `target` and decode forward to the first frame at or past it.
fn decode_at<S: DecodeSource + ?Sized>(source: &mut S, target: u64) -> Option<DecodedFrame> {
    source.seek(target).ok()?;
    loop {
        let frame = source.decode_next().ok()??;
        if frame.index >= target {
            return Some(frame);
        }
    }
}

/// Largest strictly increasing timestamp seen by a sampled scan.
#[derive(Default)]
struct ScanTracker {
    last_time: f64,
    accepted: u64,
}

impl ScanTracker {
    fn observe(&mut self, reported_time: Option<f64>) {
        if let Some(time) = reported_time.filter(|&time| time > self.last_time) {
            self.last_time = time;
            self.accepted += 1;
        }
    }

    fn result(&self) -> Option<f64> {
        (self.last_time > 0.0).then_some(self.last_time)
    }
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::*;
    use crate::error::StillframeError;

    /// Seeks land on the preceding multiple of `keyframe_interval`.
    struct KeyframeSource {
        properties: SourceProperties,
        keyframe_interval: u64,
        position: u64,
    }

    impl DecodeSource for KeyframeSource {
        fn properties(&self) -> SourceProperties {
            self.properties
        }

        fn end_position(&mut self) -> Option<f64> {
            None
        }

        fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
            self.position = frame_index - frame_index % self.keyframe_interval;
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
                image: DynamicImage::new_rgb8(1, 1),
            }))
        }
    }

    #[test]
    fn strided_scan_decodes_past_keyframe_landings() {
        let properties = SourceProperties {
            total_frame_count: 900,
            reported_frame_rate: 30.0,
            width: 1,
            height: 1,
        };
        let mut source = KeyframeSource {
            properties,
            keyframe_interval: 10,
            position: 0,
        };

        // Stride 3: the last target is 897, whose keyframe is 890.
        let seconds = sampled_scan(&mut source, &properties).unwrap();
        assert!((seconds - 897.0 / 30.0).abs() < 1e-9, "got {seconds}");
    }

    #[test]
    fn oversized_duration_is_not_representable() {
        let estimate =
            DurationEstimate::from_candidates(30.0, vec![(DurationMethod::EndSeek, 1e20)]);
        assert!(estimate.is_determinable());
        assert_eq!(estimate.duration(), None);

        let estimate =
            DurationEstimate::from_candidates(30.0, vec![(DurationMethod::EndSeek, 2.5)]);
        assert_eq!(estimate.duration(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn decode_at_skips_to_the_target_frame() {
        let properties = SourceProperties {
            total_frame_count: 50,
            reported_frame_rate: 25.0,
            width: 1,
            height: 1,
        };
        let mut source = KeyframeSource {
            properties,
            keyframe_interval: 12,
            position: 0,
        };

        assert_eq!(decode_at(&mut source, 30).map(|frame| frame.index), Some(30));
        assert!(decode_at(&mut source, 60).is_none());
    }
}
