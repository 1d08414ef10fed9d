//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing extraction,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for the snapshot delivered after every written frame.
//!
//! Observers are informational only and must not block: the extraction loop
//! calls them inline between frames. Standard `mpsc` senders implement
//! [`ProgressCallback`] directly, so a UI thread can simply drain a channel.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, mpsc};
//!
//! use stillframe::{ExtractOptions, ProgressInfo, StillframeError, TimeWindow, VideoFile};
//!
//! let (sender, receiver) = mpsc::channel::<ProgressInfo>();
//! let options = ExtractOptions::new().with_progress(Arc::new(sender));
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let report = video.extract_to_directory("frames", &TimeWindow::full(), &options)?;
//!
//! for info in receiver.try_iter() {
//!     println!("{} saved ({:.1}%)", info.selected_count, info.percent_of_window);
//! }
//! println!("{} frame(s) written", report.frames_written);
//! # Ok::<(), StillframeError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc::{Sender, SyncSender},
};
use std::time::{Duration, Instant};

use crate::frame::ExtractedFrame;
use crate::plan::SamplingPlan;

/// A snapshot of extraction progress, taken right after a frame was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    /// Frames written so far, including this one.
    pub selected_count: u64,
    /// Frames the plan will select in total.
    pub planned_count: u64,
    /// How far through the time window the last written frame is (0.0 to 100.0).
    pub percent_of_window: f32,
    /// Absolute index of the frame just written.
    pub frame_index: u64,
    /// Timestamp of the frame just written.
    pub timestamp: Duration,
    /// Wall-clock time since extraction started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during extraction.
///
/// Implementations must be [`Send`] and [`Sync`] so extraction can run on a
/// worker thread while the observer lives elsewhere.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// operation. Use [`CancellationToken`] to stop early.
pub trait ProgressCallback: Send + Sync {
    /// Called once after every written frame.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default observer.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

impl ProgressCallback for Sender<ProgressInfo> {
    fn on_progress(&self, info: &ProgressInfo) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(info.clone());
    }
}

impl ProgressCallback for SyncSender<ProgressInfo> {
    /// Uses `try_send`; updates are dropped while the channel is full.
    fn on_progress(&self, info: &ProgressInfo) {
        let _ = self.try_send(info.clone());
    }
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated extraction. The decode loop checks the token before each frame,
/// releases the decoder, and returns what was written so far.
///
/// # Example
///
/// ```
/// use stillframe::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wrap an existing flag, e.g. one registered with a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { cancelled: flag }
    }

    /// The shared flag behind this token.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing for one extraction run and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    plan: SamplingPlan,
    selected_count: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, plan: SamplingPlan) -> Self {
        Self {
            callback,
            plan,
            selected_count: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one written frame and notify the observer.
    pub(crate) fn frame_written(&mut self, frame: &ExtractedFrame) {
        self.selected_count += 1;

        let info = ProgressInfo {
            selected_count: self.selected_count,
            planned_count: self.plan.selected_count(),
            percent_of_window: self.plan.percent_of_window(frame.index),
            frame_index: frame.index,
            timestamp: frame.timestamp,
            elapsed: self.start_time.elapsed(),
        };

        self.callback.on_progress(&info);
    }
}
