//! Lightweight video probing.
//!
//! [`VideoProbe`] summarises a file without keeping the demuxer open, which
//! suits inspecting many files in a row. Use
//! [`VideoFile::open`](crate::VideoFile::open) to extract frames.

use std::path::Path;

use crate::error::StillframeError;
use crate::metadata::VideoInfo;
use crate::video_file::VideoFile;

/// Opens a file, reads its [`VideoInfo`], and closes it again.
///
/// # Example
///
/// ```no_run
/// use stillframe::VideoProbe;
///
/// let info = VideoProbe::probe("input.mp4")?;
/// println!("{}: {:?}", info.file_name, info.duration());
/// # Ok::<(), stillframe::StillframeError>(())
/// ```
pub struct VideoProbe;

impl VideoProbe {
    /// Probe a single file.
    ///
    /// # Errors
    ///
    /// Everything [`VideoFile::open`] and [`VideoFile::info`] return.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoInfo, StillframeError> {
        let mut video = VideoFile::open(path)?;
        video.info()
    }

    /// Probe several files.
    ///
    /// A file that cannot be probed yields an `Err` entry instead of
    /// aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<VideoInfo, StillframeError>> {
        paths.iter().map(Self::probe).collect()
    }
}
