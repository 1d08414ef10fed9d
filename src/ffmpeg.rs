//! FFmpeg initialisation and native log level.
//!
//! FFmpeg has its own logging, separate from the Rust [`log`] facade, and
//! prints warnings about damaged streams straight to stderr. This module
//! lets callers tune that without importing `ffmpeg-next` themselves, and
//! performs the one-time library initialisation shared by every
//! [`VideoFile`](crate::VideoFile).
//!
//! # Example
//!
//! ```no_run
//! use stillframe::FfmpegLogLevel;
//!
//! // Only let FFmpeg report errors it cannot recover from.
//! stillframe::set_ffmpeg_log_level(FfmpegLogLevel::Fatal);
//!
//! let level: FfmpegLogLevel = "warning".parse().unwrap();
//! stillframe::set_ffmpeg_log_level(level);
//! ```

use std::str::FromStr;
use std::sync::OnceLock;

use ffmpeg_next::util::log::Level;

static FFMPEG_INITIALIZED: OnceLock<Result<(), ffmpeg_next::Error>> = OnceLock::new();

/// Initialise FFmpeg once per process. Later calls return the first result.
pub(crate) fn initialize() -> Result<(), ffmpeg_next::Error> {
    FFMPEG_INITIALIZED
        .get_or_init(|| {
            ffmpeg_next::init()?;
            log::debug!("FFmpeg initialised");
            Ok(())
        })
        .clone()
}

/// FFmpeg's own log verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(format!("unknown FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's log verbosity.
///
/// Affects only what FFmpeg prints to stderr, not messages emitted through
/// the `log` crate.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.into());
}
