//! The seekable decode capability that reconciliation and sampling run on.
//!
//! [`DecodeSource`] is deliberately small: report container properties, seek
//! to a frame index, decode the next frame, and probe the elapsed time at the
//! end of the stream. [`VideoFile`](crate::VideoFile) implements it on top of
//! FFmpeg; tests implement it over synthetic frames.

use std::path::Path;

use image::DynamicImage;

use crate::error::StillframeError;

/// Container extensions accepted by [`check_supported_format`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".mkv", ".wmv", ".flv", ".webm"];

/// Properties reported by the container when the source is opened.
///
/// Both `total_frame_count` and `reported_frame_rate` come straight from the
/// container and may be zero when it does not know them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProperties {
    /// Frame count as reported by the container. `0` when unknown.
    pub total_frame_count: u64,
    /// Frames per second as reported by the container. `0.0` when unknown.
    pub reported_frame_rate: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// One frame as produced by [`DecodeSource::decode_next`].
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Absolute, zero-based index of this frame in the stream.
    pub index: u64,
    /// Presentation time reported by the decoder, in seconds, if it has one.
    pub reported_time: Option<f64>,
    /// The decoded raster.
    pub image: DynamicImage,
}

/// A seekable, sequential frame decoder.
///
/// Implementations are used from a single thread; nothing here requires
/// `Send` or `Sync`.
pub trait DecodeSource {
    /// Container-reported properties. Cheap; does not touch the decoder.
    fn properties(&self) -> SourceProperties;

    /// Seek to the logical end of the stream and report the elapsed time there,
    /// in seconds.
    ///
    /// Returns `None` when the container cannot answer. The decode position
    /// afterwards is unspecified; callers seek before decoding again.
    fn end_position(&mut self) -> Option<f64>;

    /// Position the decoder so that the next decoded frames lead up to
    /// `frame_index`.
    ///
    /// Implementations may land earlier than requested (for example on the
    /// preceding keyframe); every [`DecodedFrame`] carries its own absolute
    /// index so callers can skip ahead.
    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError>;

    /// Decode the next frame in stream order.
    ///
    /// `Ok(None)` signals the end of the stream.
    fn decode_next(&mut self) -> Result<Option<DecodedFrame>, StillframeError>;
}

impl<S: DecodeSource + ?Sized> DecodeSource for &mut S {
    fn properties(&self) -> SourceProperties {
        (**self).properties()
    }

    fn end_position(&mut self) -> Option<f64> {
        (**self).end_position()
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
        (**self).seek(frame_index)
    }

    fn decode_next(&mut self) -> Result<Option<DecodedFrame>, StillframeError> {
        (**self).decode_next()
    }
}

/// Reject paths whose extension is not a supported container format.
///
/// The check is keyed off the extension only (case-insensitive); file
/// contents are never sniffed.
///
/// # Errors
///
/// Returns [`StillframeError::UnsupportedFormat`] for any other extension,
/// including a missing one.
///
/// # Example
///
/// ```
/// use stillframe::check_supported_format;
///
/// assert!(check_supported_format("clip.MKV").is_ok());
/// assert!(check_supported_format("notes.txt").is_err());
/// ```
pub fn check_supported_format<P: AsRef<Path>>(path: P) -> Result<(), StillframeError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(StillframeError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        })
    }
}
