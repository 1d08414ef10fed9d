//! Extraction options.
//!
//! [`ExtractOptions`] is a builder that threads the sampling rate, output
//! encoding, progress observer, and cancellation token through extraction
//! calls without widening every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillframe::{
//!     CancellationToken, ExtractOptions, ImageOutputFormat, ProgressCallback, ProgressInfo,
//!     SamplingRate,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} frames, {:.1}%", info.selected_count, info.percent_of_window);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_sampling_rate(SamplingRate::PerSecond(1.0))
//!     .with_output_format(ImageOutputFormat::Png)
//!     .with_quality(3)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::output::ImageOutputFormat;
use crate::plan::SamplingRate;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Options for one extraction run.
///
/// A default-constructed value extracts every frame to PNG at the encoder's
/// default compression, with no observer and no cancellation.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) sampling_rate: SamplingRate,
    pub(crate) quality: Option<u8>,
    pub(crate) output_format: ImageOutputFormat,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("sampling_rate", &self.sampling_rate)
            .field("quality", &self.quality)
            .field("output_format", &self.output_format)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            sampling_rate: SamplingRate::AllFrames,
            quality: None,
            output_format: ImageOutputFormat::Png,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set how densely frames are sampled. Defaults to every frame.
    #[must_use]
    pub fn with_sampling_rate(mut self, rate: SamplingRate) -> Self {
        self.sampling_rate = rate;
        self
    }

    /// Set the encoder quality, interpreted by the output format.
    ///
    /// PNG treats it as a compression level `0`–`9`; JPEG as a quality
    /// `1`–`100`. Other formats ignore it.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set the still-image format frames are written in. Defaults to PNG.
    #[must_use]
    pub fn with_output_format(mut self, format: ImageOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Attach a progress observer, invoked after every written frame.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every decoded frame.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The configured sampling rate.
    pub fn sampling_rate(&self) -> SamplingRate {
        self.sampling_rate
    }

    /// The configured output format.
    pub fn output_format(&self) -> ImageOutputFormat {
        self.output_format
    }

    /// The configured quality, if any.
    pub fn quality(&self) -> Option<u8> {
        self.quality
    }
}
