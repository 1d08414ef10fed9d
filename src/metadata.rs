//! Video information summaries.
//!
//! [`VideoInfo`] is what [`VideoFile::info`](crate::VideoFile::info) and
//! [`VideoProbe::probe`](crate::VideoProbe::probe) return: container
//! properties plus the reconciled duration, so callers can show every
//! duration candidate next to the one that was chosen.

use std::path::PathBuf;
use std::time::Duration;

use crate::reconcile::DurationEstimate;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Summary of a video file.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoInfo {
    /// Path the file was opened from.
    pub path: PathBuf,
    /// Final path component, for display.
    pub file_name: String,
    /// Frame count reported by the container (`0` when unknown).
    pub total_frames: u64,
    /// Frame rate reported by the container (`0.0` when unknown).
    pub frames_per_second: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Reconciled duration with every candidate that produced a value.
    pub duration: DurationEstimate,
    /// File size on disk.
    pub size_bytes: u64,
}

impl VideoInfo {
    /// The chosen duration, if one could be determined.
    pub fn duration(&self) -> Option<Duration> {
        self.duration.duration()
    }

    /// File size in mebibytes.
    pub fn size_megabytes(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MEGABYTE
    }
}
