//! Frame sampling over a time window.
//!
//! [`extract`] reconciles the source's duration, computes a
//! [`SamplingPlan`], seeks once to the start of the window, and returns a
//! [`FrameSampler`]: a lazy iterator that decodes sequentially and yields
//! only the frames the plan selects. [`extract_to_sink`] drives that
//! iterator into a [`FrameSink`], reporting progress after every write.
//!
//! Decoding is single-pass and single-threaded. Cancellation is checked
//! before every decoded frame. A decode failure partway through ends the run
//! early without discarding what was already written.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use stillframe::{ExtractOptions, SamplingRate, StillframeError, TimeWindow, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let window = TimeWindow::new(Duration::from_secs(10), Some(Duration::from_secs(20)));
//! let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(2.0));
//!
//! for frame in stillframe::extract(&mut video, &window, &options)? {
//!     let frame = frame?;
//!     println!("{} ({}x{})", frame.identity(), frame.image.width(), frame.image.height());
//! }
//! # Ok::<(), StillframeError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::configuration::ExtractOptions;
use crate::error::StillframeError;
use crate::frame::ExtractedFrame;
use crate::output::FrameSink;
use crate::plan::{SamplingPlan, TimeWindow};
use crate::progress::{CancellationToken, ProgressTracker};
use crate::reconcile::{DurationEstimate, reconcile};
use crate::source::{DecodeSource, SourceProperties};

/// Why an extraction stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The window was fully decoded, or the stream ended first.
    Completed,
    /// A [`CancellationToken`] was triggered.
    Cancelled,
    /// Decoding failed partway; frames before the failure were kept.
    DecodeFailed(String),
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StopReason::Completed => f.write_str("completed"),
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::DecodeFailed(reason) => write!(f, "decode failed: {reason}"),
        }
    }
}

/// Outcome of [`extract_to_sink`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ExtractionReport {
    /// The plan that was executed.
    pub plan: SamplingPlan,
    /// The reconciled duration of the source.
    pub estimate: DurationEstimate,
    /// Frames successfully handed to the sink.
    pub frames_written: u64,
    /// Identities of the written frames, in order.
    pub identities: Vec<String>,
    /// Why the run ended.
    pub stop_reason: StopReason,
}

impl ExtractionReport {
    /// `true` unless the run was cancelled or hit a decode failure.
    pub fn is_complete(&self) -> bool {
        self.stop_reason == StopReason::Completed
    }
}

/// Lazy iterator over the frames selected by a [`SamplingPlan`].
///
/// Created by [`extract`]. Holds the source mutably for its whole lifetime;
/// dropping the sampler releases it. Not resumable: to start over, call
/// [`extract`] again with the same arguments.
///
/// A decode error is yielded once as `Some(Err(_))`, after which the
/// iterator is finished and [`stop_reason`](FrameSampler::stop_reason)
/// reports [`StopReason::DecodeFailed`].
pub struct FrameSampler<'a, S: DecodeSource + ?Sized> {
    source: &'a mut S,
    plan: SamplingPlan,
    estimate: DurationEstimate,
    frame_rate: f64,
    cancellation: Option<CancellationToken>,
    frames_decoded: u64,
    stop_reason: Option<StopReason>,
}

impl<'a, S: DecodeSource + ?Sized> FrameSampler<'a, S> {
    /// Seek `source` to the start of `plan` and prepare to decode.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the initial seek fails.
    pub fn new(
        source: &'a mut S,
        plan: SamplingPlan,
        estimate: DurationEstimate,
        cancellation: Option<CancellationToken>,
    ) -> Result<Self, StillframeError> {
        if !plan.is_empty() {
            source.seek(plan.start_frame_index())?;
        }
        let frame_rate = estimate.frame_rate;

        Ok(Self {
            source,
            plan,
            estimate,
            frame_rate,
            cancellation,
            frames_decoded: 0,
            stop_reason: None,
        })
    }

    /// The plan being executed.
    pub fn plan(&self) -> SamplingPlan {
        self.plan
    }

    /// The duration estimate computed before sampling.
    pub fn estimate(&self) -> &DurationEstimate {
        &self.estimate
    }

    /// Frames decoded inside the window so far, selected or not.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Why sampling stopped, once it has.
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    fn finish(&mut self, reason: StopReason) {
        log::debug!(
            "Sampling stopped ({reason}) after {} decoded frame(s)",
            self.frames_decoded
        );
        self.stop_reason = Some(reason);
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

impl<S: DecodeSource + ?Sized> Iterator for FrameSampler<'_, S> {
    type Item = Result<ExtractedFrame, StillframeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop_reason.is_some() {
            return None;
        }
        if self.plan.is_empty() {
            self.finish(StopReason::Completed);
            return None;
        }

        loop {
            if self.is_cancelled() {
                self.finish(StopReason::Cancelled);
                return None;
            }

            let decoded = match self.source.decode_next() {
                Ok(Some(decoded)) => decoded,
                Ok(None) => {
                    self.finish(StopReason::Completed);
                    return None;
                }
                Err(error) => {
                    log::warn!("Decode failed mid-stream, stopping early: {error}");
                    self.finish(StopReason::DecodeFailed(error.to_string()));
                    return Some(Err(error));
                }
            };

            if decoded.index > self.plan.end_frame_index_inclusive() {
                self.finish(StopReason::Completed);
                return None;
            }
            // Seeks can land before the window start.
            if decoded.index < self.plan.start_frame_index() {
                continue;
            }

            self.frames_decoded += 1;
            if self.plan.selects(decoded.index) {
                return Some(Ok(ExtractedFrame::new(
                    decoded.index,
                    self.frame_rate,
                    decoded.image,
                )));
            }
        }
    }
}

/// Plan and start a sampling pass over `source`.
///
/// Runs [`reconcile`] once, computes the [`SamplingPlan`] for `window` and
/// the options' sampling rate, seeks to the first frame of the window, and
/// returns the lazy [`FrameSampler`]. The options' cancellation token is
/// honoured; the progress observer and output settings are not used here.
///
/// When the container reports no frame count, the count implied by the
/// reconciled duration is used for clamping instead.
///
/// # Errors
///
/// - [`StillframeError::InvalidSamplingRate`] for a bad per-second rate.
/// - [`StillframeError::UnknownFrameRate`] if the container has no frame rate.
/// - Any error from the initial seek.
pub fn extract<'a, S: DecodeSource + ?Sized>(
    source: &'a mut S,
    window: &TimeWindow,
    options: &ExtractOptions,
) -> Result<FrameSampler<'a, S>, StillframeError> {
    options.sampling_rate.validate()?;

    let estimate = reconcile(source);
    let properties = source.properties();
    let total_frame_count = effective_frame_count(&properties, &estimate);

    let plan = SamplingPlan::compute(
        window,
        options.sampling_rate,
        properties.reported_frame_rate,
        total_frame_count,
    )?;

    if plan.is_empty() {
        log::info!("Time window {window:?} selects no frames");
    } else {
        log::debug!(
            "Sampling frames {}..={} every {} ({} selected of {} total)",
            plan.start_frame_index(),
            plan.end_frame_index_inclusive(),
            plan.frame_stride(),
            plan.selected_count(),
            total_frame_count,
        );
    }

    FrameSampler::new(source, plan, estimate, options.cancellation.clone())
}

/// Sample `source` over `window` and hand every selected frame to `sink`.
///
/// Progress is reported to the options' observer after each write. A decode
/// failure or cancellation ends the run early; frames already written stay
/// written and the report says why the run stopped.
///
/// # Errors
///
/// Everything [`extract`] returns, plus any error from `sink`.
pub fn extract_to_sink<S, K>(
    source: &mut S,
    window: &TimeWindow,
    sink: &mut K,
    options: &ExtractOptions,
) -> Result<ExtractionReport, StillframeError>
where
    S: DecodeSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut sampler = extract(source, window, options)?;
    let mut tracker = ProgressTracker::new(Arc::clone(&options.progress), sampler.plan());
    let mut identities = Vec::new();

    for item in sampler.by_ref() {
        // Errors are recorded as the sampler's stop reason.
        let Ok(frame) = item else { break };
        sink.write_frame(&frame)?;
        identities.push(frame.identity());
        tracker.frame_written(&frame);
    }

    let stop_reason = sampler
        .stop_reason()
        .cloned()
        .unwrap_or(StopReason::Completed);

    let report = ExtractionReport {
        plan: sampler.plan(),
        estimate: sampler.estimate().clone(),
        frames_written: identities.len() as u64,
        identities,
        stop_reason,
    };

    log::info!(
        "Extracted {} of {} planned frame(s) ({})",
        report.frames_written,
        report.plan.selected_count(),
        report.stop_reason,
    );

    Ok(report)
}

fn effective_frame_count(properties: &SourceProperties, estimate: &DurationEstimate) -> u64 {
    if properties.total_frame_count > 0 {
        properties.total_frame_count
    } else if estimate.is_determinable() && properties.reported_frame_rate > 0.0 {
        let implied = (estimate.seconds * properties.reported_frame_rate).ceil() as u64;
        log::debug!("Container frame count unknown; using {implied} implied by duration");
        implied
    } else {
        0
    }
}
