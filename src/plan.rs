//! Sampling plans: which frames a time window and sampling rate select.
//!
//! A [`SamplingPlan`] is computed once per extraction from the requested
//! [`TimeWindow`], the [`SamplingRate`], and the container's frame rate and
//! frame count. It is pure arithmetic and never touches the decoder.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use stillframe::{SamplingPlan, SamplingRate, TimeWindow};
//!
//! // 10 s at 2 fps, first five seconds, every frame.
//! let window = TimeWindow::new(Duration::ZERO, Some(Duration::from_secs(5)));
//! let plan = SamplingPlan::compute(&window, SamplingRate::AllFrames, 2.0, 20)?;
//!
//! assert_eq!(plan.start_frame_index(), 0);
//! assert_eq!(plan.end_frame_index_inclusive(), 10);
//! assert_eq!(plan.selected_count(), 11);
//! # Ok::<(), stillframe::StillframeError>(())
//! ```

use std::time::Duration;

use crate::error::StillframeError;

/// Slack added before flooring `seconds * fps`, so that a time which is a
/// whole number of frames is not pushed one frame back by float error.
const FRAME_INDEX_EPSILON: f64 = 1e-6;

/// The requested `[start, end]` time range.
///
/// `end == None` means "to the end of the stream".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    /// Start of the window.
    pub start: Duration,
    /// End of the window, inclusive of a frame that lands exactly on it.
    pub end: Option<Duration>,
}

impl TimeWindow {
    /// Create a window from `start` to `end`.
    pub fn new(start: Duration, end: Option<Duration>) -> Self {
        Self { start, end }
    }

    /// The whole stream.
    pub fn full() -> Self {
        Self::default()
    }

    /// Create a window from seconds.
    ///
    /// A negative or NaN start is treated as `0`. An infinite end means
    /// "to the end"; a NaN or negative end produces an empty window.
    pub fn from_secs(start: f64, end: Option<f64>) -> Self {
        let start = Duration::try_from_secs_f64(start).unwrap_or(Duration::ZERO);
        let end = match end {
            None => None,
            Some(end) if end == f64::INFINITY => None,
            Some(end) => Some(Duration::try_from_secs_f64(end).unwrap_or(Duration::ZERO)),
        };
        Self { start, end }
    }

    /// `true` when an end is given that is not strictly after the start.
    pub fn is_empty_interval(&self) -> bool {
        self.end.is_some_and(|end| end <= self.start)
    }
}

/// How densely to sample frames inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SamplingRate {
    /// Every decoded frame (stride 1).
    #[default]
    AllFrames,
    /// Approximately this many frames per second of video.
    ///
    /// Rates above the source frame rate collapse to every frame; frames
    /// are never duplicated.
    PerSecond(f64),
}

impl SamplingRate {
    /// Check that a per-second rate is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::InvalidSamplingRate`] otherwise.
    pub fn validate(self) -> Result<(), StillframeError> {
        match self {
            SamplingRate::PerSecond(rate) if !(rate.is_finite() && rate > 0.0) => {
                Err(StillframeError::InvalidSamplingRate(rate))
            }
            _ => Ok(()),
        }
    }

    /// Frame-index step for a source running at `frame_rate`.
    ///
    /// `max(1, round(frame_rate / rate))`.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::InvalidSamplingRate`] for a non-positive
    /// or non-finite per-second rate.
    pub fn stride(self, frame_rate: f64) -> Result<u64, StillframeError> {
        self.validate()?;
        Ok(match self {
            SamplingRate::AllFrames => 1,
            SamplingRate::PerSecond(rate) => ((frame_rate / rate).round() as u64).max(1),
        })
    }
}

/// The frame indices an extraction will decode and keep.
///
/// Bounds are clamped to `[0, total_frame_count)`. An empty plan selects
/// nothing and is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SamplingPlan {
    start_frame_index: u64,
    end_frame_index_inclusive: u64,
    frame_stride: u64,
    empty: bool,
}

impl SamplingPlan {
    /// Compute the plan for `window` over a stream of `total_frame_count`
    /// frames at `frame_rate` fps.
    ///
    /// - `start = floor(start_seconds * fps)`
    /// - with an end: the exclusive bound is `min(floor(end_seconds * fps) + 1, total)`,
    ///   so a frame landing exactly on the end second is included
    /// - without an end: the last frame of the stream
    ///
    /// # Errors
    ///
    /// - [`StillframeError::UnknownFrameRate`] if `frame_rate` is not positive.
    /// - [`StillframeError::InvalidSamplingRate`] for a bad per-second rate.
    pub fn compute(
        window: &TimeWindow,
        sampling_rate: SamplingRate,
        frame_rate: f64,
        total_frame_count: u64,
    ) -> Result<Self, StillframeError> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(StillframeError::UnknownFrameRate);
        }
        let frame_stride = sampling_rate.stride(frame_rate)?;

        if total_frame_count == 0 || window.is_empty_interval() {
            return Ok(Self::empty(frame_stride));
        }

        let start_frame_index = time_to_frame_index(window.start, frame_rate);
        let end_exclusive = match window.end {
            Some(end) => time_to_frame_index(end, frame_rate)
                .saturating_add(1)
                .min(total_frame_count),
            None => total_frame_count,
        };
        let end_frame_index_inclusive = end_exclusive - 1;

        if start_frame_index > end_frame_index_inclusive {
            return Ok(Self::empty(frame_stride));
        }

        Ok(Self {
            start_frame_index,
            end_frame_index_inclusive,
            frame_stride,
            empty: false,
        })
    }

    fn empty(frame_stride: u64) -> Self {
        Self {
            start_frame_index: 0,
            end_frame_index_inclusive: 0,
            frame_stride,
            empty: true,
        }
    }

    /// First absolute frame index of the window.
    pub fn start_frame_index(&self) -> u64 {
        self.start_frame_index
    }

    /// Last absolute frame index of the window (inclusive).
    pub fn end_frame_index_inclusive(&self) -> u64 {
        self.end_frame_index_inclusive
    }

    /// Step between selected frames. Always at least 1.
    pub fn frame_stride(&self) -> u64 {
        self.frame_stride
    }

    /// `true` if the window selects no frames.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Number of frames in the window, selected or not.
    pub fn window_frame_count(&self) -> u64 {
        if self.empty {
            0
        } else {
            self.end_frame_index_inclusive - self.start_frame_index + 1
        }
    }

    /// Number of frames the plan selects.
    pub fn selected_count(&self) -> u64 {
        match self.window_frame_count() {
            0 => 0,
            count => (count - 1) / self.frame_stride + 1,
        }
    }

    /// `true` if `index` falls inside the window.
    pub fn contains(&self, index: u64) -> bool {
        !self.empty && (self.start_frame_index..=self.end_frame_index_inclusive).contains(&index)
    }

    /// `true` if the frame at absolute `index` should be kept.
    pub fn selects(&self, index: u64) -> bool {
        self.contains(index) && (index - self.start_frame_index) % self.frame_stride == 0
    }

    /// The selected indices in ascending order.
    pub fn selected_indices(&self) -> impl Iterator<Item = u64> + use<> {
        let (start, end, stride) = if self.empty {
            (1, 0, 1)
        } else {
            (
                self.start_frame_index,
                self.end_frame_index_inclusive,
                self.frame_stride,
            )
        };
        (start..=end).step_by(stride as usize)
    }

    /// How far through the window `index` is, as a percentage reaching
    /// `100.0` on the last frame.
    pub fn percent_of_window(&self, index: u64) -> f32 {
        let count = self.window_frame_count();
        if count == 0 {
            return 100.0;
        }
        let done = index.saturating_sub(self.start_frame_index).saturating_add(1).min(count);
        (done as f32 / count as f32) * 100.0
    }
}

/// `floor(seconds * fps)`, saturating.
pub(crate) fn time_to_frame_index(time: Duration, frame_rate: f64) -> u64 {
    (time.as_secs_f64() * frame_rate + FRAME_INDEX_EPSILON).floor() as u64
}
