//! Video file validation.
//!
//! [`ValidationReport::from_info`] inspects a [`VideoInfo`] and lists what
//! will make extraction unreliable: missing frame rate, missing frame count,
//! a duration no method could determine, or duration candidates that
//! disagree with each other.
//!
//! # Example
//!
//! ```no_run
//! use stillframe::{ValidationReport, VideoProbe};
//!
//! let info = VideoProbe::probe("input.mp4")?;
//! let report = ValidationReport::from_info(&info);
//! if !report.is_valid() {
//!     print!("{report}");
//! }
//! # Ok::<(), stillframe::StillframeError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::metadata::VideoInfo;
use crate::reconcile::DISAGREEMENT_TOLERANCE;

const HIGH_FRAME_RATE: f64 = 240.0;

/// Findings from validating a video file.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Issues that make results less trustworthy.
    pub warnings: Vec<String>,
    /// Issues that prevent extraction.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Validate a file summary.
    pub fn from_info(info: &VideoInfo) -> Self {
        let mut report = Self::default();

        if info.width == 0 || info.height == 0 {
            report.errors.push(format!(
                "Invalid video dimensions: {}x{}",
                info.width, info.height
            ));
        }

        if info.frames_per_second <= 0.0 {
            report.errors.push(
                "Video frame rate is unknown; time windows cannot be mapped onto frames"
                    .to_string(),
            );
        } else if info.frames_per_second > HIGH_FRAME_RATE {
            report.warnings.push(format!(
                "Unusually high frame rate ({:.1} fps)",
                info.frames_per_second
            ));
        }

        if info.total_frames == 0 {
            if info.duration.is_determinable() {
                report.warnings.push(
                    "Container reports no frame count; it will be derived from the duration"
                        .to_string(),
                );
            } else {
                report
                    .warnings
                    .push("Container reports no frame count".to_string());
            }
        }

        if !info.duration.is_determinable() {
            report
                .warnings
                .push("Duration could not be determined by any method".to_string());
        } else if info.duration.has_disagreement() {
            report.warnings.push(format!(
                "Duration estimates differ by {:.3}s (more than {:.0}% of {:.3}s)",
                info.duration.spread(),
                DISAGREEMENT_TOLERANCE * 100.0,
                info.duration.seconds,
            ));
        }

        report.info.push(format!(
            "Video: {} {}x{} @ {:.3} fps, {} frames reported",
            info.codec, info.width, info.height, info.frames_per_second, info.total_frames
        ));
        for (method, seconds) in &info.duration.candidate_methods {
            report.info.push(format!("Duration ({method}): {seconds:.3}s"));
        }

        report
    }

    /// `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings of any severity.
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}
