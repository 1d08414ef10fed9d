//! Error types for the `stillframe` crate.
//!
//! This module defines [`StillframeError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (paths,
//! extensions, upstream messages) to diagnose a failure without extra logging
//! at the call site.
//!
//! Not every failure is an error. An empty time window produces an empty
//! [`SamplingPlan`](crate::SamplingPlan), and a decode failure partway through
//! a directory extraction is reported through
//! [`StopReason::DecodeFailed`](crate::StopReason::DecodeFailed) so frames that
//! were already written are kept.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `stillframe` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillframeError {
    /// The file extension is not one of the supported container formats.
    ///
    /// Checked from the path alone, before any decode attempt.
    #[error("Unsupported video format '{extension}' for {path}")]
    UnsupportedFormat {
        /// Path that was passed to [`VideoFile::open`](crate::VideoFile::open).
        path: PathBuf,
        /// The lower-cased extension including the leading dot, or empty.
        extension: String,
    },

    /// The video source could not be opened or has nothing decodable.
    #[error("Video source unavailable at {path}: {reason}")]
    SourceUnavailable {
        /// Path of the source.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A per-second sampling rate that is not a positive, finite number.
    #[error("Invalid sampling rate: {0} (must be a positive number of frames per second)")]
    InvalidSamplingRate(f64),

    /// The container reports no usable frame rate, so times cannot be mapped
    /// onto frame indices.
    #[error("Video frame rate is unknown; cannot map the time window onto frames")]
    UnknownFrameRate,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image encoding error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for StillframeError {
    fn from(error: FfmpegError) -> Self {
        StillframeError::FfmpegError(error.to_string())
    }
}
