//! Background extraction for async callers.
//!
//! [`extract_to_directory_async`] runs a whole directory extraction on a
//! Tokio blocking thread and returns an [`ExtractionTask`]. Await the task
//! for the [`ExtractionReport`]; meanwhile, progress arrives through a
//! bounded channel and the run can be cancelled from the async side.
//!
//! Decoding stays sequential on one thread. Progress updates are dropped
//! rather than queued when the receiver falls behind.
//!
//! # Example
//!
//! ```no_run
//! use stillframe::{ExtractOptions, StillframeError, TimeWindow};
//!
//! # async fn example() -> Result<(), StillframeError> {
//! let mut task = stillframe::extract_to_directory_async(
//!     "input.mp4",
//!     "frames",
//!     TimeWindow::full(),
//!     ExtractOptions::new(),
//! );
//!
//! while let Some(progress) = task.next_progress().await {
//!     println!("{:.0}%", progress.percent_of_window);
//! }
//! let report = task.await?;
//! println!("wrote {} frame(s)", report.frames_written);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::io::Error as IoError;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::configuration::ExtractOptions;
use crate::error::StillframeError;
use crate::plan::TimeWindow;
use crate::progress::{CancellationToken, ProgressCallback, ProgressInfo};
use crate::sampler::ExtractionReport;
use crate::video_file::extract_frames;

/// Capacity of the progress channel.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

impl ProgressCallback for Sender<ProgressInfo> {
    /// Uses `try_send`; updates are dropped while the channel is full.
    fn on_progress(&self, info: &ProgressInfo) {
        let _ = self.try_send(info.clone());
    }
}

/// A directory extraction running on a blocking thread.
///
/// Resolves to the run's [`ExtractionReport`]. Dropping the task does not
/// stop the thread; call [`cancel`](ExtractionTask::cancel) first.
pub struct ExtractionTask {
    progress: Receiver<ProgressInfo>,
    cancellation: CancellationToken,
    handle: JoinHandle<Result<ExtractionReport, StillframeError>>,
}

impl ExtractionTask {
    /// Wait for the next progress update. `None` once the run has ended.
    pub async fn next_progress(&mut self) -> Option<ProgressInfo> {
        self.progress.recv().await
    }

    /// Ask the run to stop before the next frame.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// The token controlling this run.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Future for ExtractionTask {
    type Output = Result<ExtractionReport, StillframeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|result| {
            result.unwrap_or_else(|join_error| {
                Err(StillframeError::IoError(IoError::other(format!(
                    "extraction thread failed: {join_error}"
                ))))
            })
        })
    }
}

/// Extract frames from `input` into `output_dir` on a blocking thread.
///
/// The options' progress observer is replaced by the task's channel. Their
/// cancellation token is kept if present, otherwise a fresh one is created.
/// Must be called from within a Tokio runtime.
pub fn extract_to_directory_async<P, Q>(
    input: P,
    output_dir: Q,
    window: TimeWindow,
    options: ExtractOptions,
) -> ExtractionTask
where
    P: Into<PathBuf>,
    Q: Into<PathBuf>,
{
    let input = input.into();
    let output_dir = output_dir.into();
    let (sender, receiver) = tokio::sync::mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    let cancellation = options.cancellation.clone().unwrap_or_default();

    let options = options
        .with_progress(Arc::new(sender))
        .with_cancellation(cancellation.clone());

    let handle = tokio::task::spawn_blocking(move || {
        extract_frames(&input, &output_dir, &window, &options)
    });

    ExtractionTask {
        progress: receiver,
        cancellation,
        handle,
    }
}
