//! # stillframe
//!
//! Extract time-indexed still frames from video files, with duration
//! reconciliation for containers that misreport their own length.
//!
//! Given a video, a time window, and a sampling rate, `stillframe` works out
//! exactly which frames fall inside the window, decodes the stream once from
//! the start of the window, and writes every selected frame as an image whose
//! file name carries its frame index and timestamp. Decoding is powered by
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate; images are encoded with [`image`].
//!
//! ## Quick Start
//!
//! ### Extract two frames per second from the first five seconds
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use stillframe::{ExtractOptions, SamplingRate, TimeWindow};
//!
//! let window = TimeWindow::new(Duration::ZERO, Some(Duration::from_secs(5)));
//! let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(2.0));
//! let report = stillframe::extract_frames("input.mp4", "frames", &window, &options).unwrap();
//! println!("{} frame(s) written", report.frames_written);
//! ```
//!
//! ### Inspect the duration candidates
//!
//! ```no_run
//! use stillframe::VideoProbe;
//!
//! let info = VideoProbe::probe("input.mp4").unwrap();
//! for (method, seconds) in &info.duration.candidate_methods {
//!     println!("{method}: {seconds:.3}s");
//! }
//! ```
//!
//! ### Iterate lazily
//!
//! ```no_run
//! use stillframe::{ExtractOptions, TimeWindow, VideoFile};
//!
//! let mut video = VideoFile::open("input.mkv").unwrap();
//! let window = TimeWindow::from_secs(10.0, Some(12.0));
//! for frame in stillframe::extract(&mut video, &window, &ExtractOptions::new()).unwrap() {
//!     let frame = frame.unwrap();
//!     println!("{}", frame.identity());
//! }
//! ```
//!
//! ## Features
//!
//! - **Duration reconciliation**: end-seek, frames over rate, and last
//!   decoded frame, with a bounded sampled scan as fallback
//! - **Deterministic sampling**: inclusive window bounds, stride derived from
//!   the sampling rate, stable time-ordered frame identities
//! - **Best-effort extraction**: a decode failure partway through keeps what
//!   was already written
//! - **Progress & cancellation**: observer callbacks and a
//!   [`CancellationToken`] checked between frames
//! - **Pluggable sources and sinks**: [`DecodeSource`] and [`FrameSink`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `extract_to_directory_async` runs extraction on a Tokio blocking thread |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod output;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod reconcile;
pub mod sampler;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod validation;
pub mod video_file;

pub use configuration::ExtractOptions;
pub use error::StillframeError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::{ExtractedFrame, frame_identity};
pub use metadata::VideoInfo;
pub use output::{DirectoryWriter, FrameSink, ImageOutputFormat, encode_image};
pub use plan::{SamplingPlan, SamplingRate, TimeWindow};
pub use probe::VideoProbe;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use reconcile::{DurationEstimate, DurationMethod, reconcile};
pub use sampler::{ExtractionReport, FrameSampler, StopReason, extract, extract_to_sink};
pub use source::{
    DecodeSource, DecodedFrame, SUPPORTED_EXTENSIONS, SourceProperties, check_supported_format,
};
#[cfg(feature = "async")]
pub use stream::{ExtractionTask, extract_to_directory_async};
pub use validation::ValidationReport;
pub use video_file::{VideoFile, extract_frames};
