//! Writing extracted frames as still images.
//!
//! The sampler hands every selected frame to a [`FrameSink`]. The sink used
//! for directory output is [`DirectoryWriter`], which names each file after
//! the frame's identity and encodes it with the `image` crate. Closures
//! taking `&ExtractedFrame` are sinks too, which is handy for in-memory
//! consumers.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{
    DynamicImage, ImageFormat,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
    },
};

use crate::error::StillframeError;
use crate::frame::ExtractedFrame;

/// JPEG quality used when none is configured.
const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Still-image format for written frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageOutputFormat {
    /// Lossless PNG. The default.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
    /// Uncompressed BMP.
    Bmp,
    /// TIFF.
    Tiff,
}

impl ImageOutputFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageOutputFormat::Png => "png",
            ImageOutputFormat::Jpeg => "jpg",
            ImageOutputFormat::Bmp => "bmp",
            ImageOutputFormat::Tiff => "tiff",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            ImageOutputFormat::Png => ImageFormat::Png,
            ImageOutputFormat::Jpeg => ImageFormat::Jpeg,
            ImageOutputFormat::Bmp => ImageFormat::Bmp,
            ImageOutputFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

impl Display for ImageOutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageOutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(ImageOutputFormat::Png),
            "jpg" | "jpeg" => Ok(ImageOutputFormat::Jpeg),
            "bmp" => Ok(ImageOutputFormat::Bmp),
            "tif" | "tiff" => Ok(ImageOutputFormat::Tiff),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}

/// Receives each selected frame, in order.
pub trait FrameSink {
    /// Persist or otherwise consume one frame.
    ///
    /// An error stops the extraction and is returned to the caller.
    fn write_frame(&mut self, frame: &ExtractedFrame) -> Result<(), StillframeError>;
}

impl<F> FrameSink for F
where
    F: FnMut(&ExtractedFrame) -> Result<(), StillframeError>,
{
    fn write_frame(&mut self, frame: &ExtractedFrame) -> Result<(), StillframeError> {
        self(frame)
    }
}

/// Writes one image file per frame into a directory.
///
/// Files are named `<identity>.<ext>`, e.g. `frame_000042_14.000s.png`. Each
/// image is encoded to a `.part` file first and renamed into place, so an
/// interrupted run never leaves a truncated image behind.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    directory: PathBuf,
    format: ImageOutputFormat,
    quality: Option<u8>,
}

impl DirectoryWriter {
    /// Create the output directory (and parents) if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::IoError`] if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(
        directory: P,
        format: ImageOutputFormat,
        quality: Option<u8>,
    ) -> Result<Self, StillframeError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        log::debug!("Writing {format} frames to {}", directory.display());
        Ok(Self {
            directory,
            format,
            quality,
        })
    }

    /// The output directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where the frame with `identity` ends up.
    pub fn path_for(&self, identity: &str) -> PathBuf {
        self.directory
            .join(format!("{identity}.{}", self.format.extension()))
    }
}

impl FrameSink for DirectoryWriter {
    fn write_frame(&mut self, frame: &ExtractedFrame) -> Result<(), StillframeError> {
        let final_path = self.path_for(&frame.identity());
        let mut partial_path = final_path.clone().into_os_string();
        partial_path.push(".part");
        let partial_path = PathBuf::from(partial_path);

        let result = File::create(&partial_path)
            .map_err(StillframeError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                encode_image(&frame.image, self.format, self.quality, &mut writer)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&partial_path, &final_path).map_err(StillframeError::from));

        if result.is_err() {
            let _ = fs::remove_file(&partial_path);
        } else {
            log::trace!("Wrote {}", final_path.display());
        }
        result
    }
}

/// Encode `image` in `format` into `writer`.
///
/// `quality` is interpreted per format: a PNG compression level (`0`–`2`
/// fast, `3`–`6` default, `7`–`9` best) or a JPEG quality (`1`–`100`).
///
/// # Errors
///
/// Returns [`StillframeError::ImageError`] if encoding fails.
pub fn encode_image<W: Write + Seek>(
    image: &DynamicImage,
    format: ImageOutputFormat,
    quality: Option<u8>,
    writer: &mut W,
) -> Result<(), StillframeError> {
    match format {
        ImageOutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                writer,
                png_compression(quality),
                FilterType::Adaptive,
            );
            image.write_with_encoder(encoder)?;
        }
        ImageOutputFormat::Jpeg => {
            let quality = quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100);
            let encoder = JpegEncoder::new_with_quality(writer, quality);
            // JPEG has no alpha channel.
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
        other => image.write_to(writer, other.image_format())?,
    }
    Ok(())
}

fn png_compression(level: Option<u8>) -> CompressionType {
    match level {
        None => CompressionType::Default,
        Some(0..=2) => CompressionType::Fast,
        Some(3..=6) => CompressionType::Default,
        Some(_) => CompressionType::Best,
    }
}
