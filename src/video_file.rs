//! FFmpeg-backed video source.
//!
//! [`VideoFile`] opens a container, picks the best video stream, and
//! implements [`DecodeSource`] on top of FFmpeg's demuxer and decoder:
//! keyframe seeking, sequential decoding to RGB, and an end-of-stream probe
//! for duration reconciliation.
//!
//! The decoder is owned by the `VideoFile` and released when it is dropped,
//! whichever way an extraction ends.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::AV_NOPTS_VALUE;
use image::DynamicImage;

use crate::{
    configuration::ExtractOptions,
    conversion,
    error::StillframeError,
    metadata::VideoInfo,
    output::DirectoryWriter,
    plan::TimeWindow,
    reconcile::reconcile,
    sampler::{ExtractionReport, extract_to_sink},
    source::{DecodeSource, DecodedFrame, SourceProperties, check_supported_format},
};

/// An opened video file.
///
/// # Example
///
/// ```no_run
/// use stillframe::{ExtractOptions, SamplingRate, StillframeError, TimeWindow, VideoFile};
///
/// let mut video = VideoFile::open("input.mp4")?;
/// let info = video.info()?;
/// println!("{}x{} @ {:.2} fps", info.width, info.height, info.frames_per_second);
///
/// let options = ExtractOptions::new().with_sampling_rate(SamplingRate::PerSecond(1.0));
/// let report = video.extract_to_directory("frames", &TimeWindow::full(), &options)?;
/// println!("wrote {} frame(s)", report.frames_written);
/// # Ok::<(), StillframeError>(())
/// ```
pub struct VideoFile {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    time_base: Rational,
    /// First PTS of the stream; frame times are measured from here.
    start_pts: i64,
    properties: SourceProperties,
    codec: String,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    /// Lowest index the next decoded frame may take.
    next_index: u64,
    /// No frame has been decoded since the last seek.
    resync: bool,
    path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("properties", &self.properties)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file for decoding.
    ///
    /// The extension is checked first, then FFmpeg opens the container and a
    /// decoder is created for the best video stream.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::UnsupportedFormat`] if the extension is not a
    ///   supported container, before anything is read.
    /// - [`StillframeError::SourceUnavailable`] if the file is missing, cannot
    ///   be opened, or has no decodable video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StillframeError> {
        let path = path.as_ref().to_path_buf();
        check_supported_format(&path)?;

        let unavailable = |reason: String| StillframeError::SourceUnavailable {
            path: path.clone(),
            reason,
        };

        if !path.is_file() {
            return Err(unavailable("file does not exist".to_string()));
        }

        log::debug!("Opening video file: {}", path.display());

        crate::ffmpeg::initialize()
            .map_err(|error| unavailable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| unavailable(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| unavailable("no video stream found".to_string()))?;

        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = match stream.start_time() {
            AV_NOPTS_VALUE => 0,
            start => start,
        };
        let total_frame_count = stream.frames().max(0) as u64;
        let reported_frame_rate = match conversion::rational_to_f64(stream.avg_frame_rate()) {
            rate if rate > 0.0 => rate,
            _ => conversion::rational_to_f64(stream.rate()),
        };

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| unavailable(format!("cannot create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(unavailable(format!("invalid frame size {width}x{height}")));
        }

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| unavailable(format!("cannot convert pixel format: {error}")))?;

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let properties = SourceProperties {
            total_frame_count,
            reported_frame_rate,
            width,
            height,
        };

        log::info!(
            "Opened {} ({}x{}, {:.3} fps, {} frames reported, codec={})",
            path.display(),
            width,
            height,
            reported_frame_rate,
            total_frame_count,
            codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            start_pts,
            properties,
            codec,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            next_index: 0,
            resync: true,
            path,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Summarise the file, reconciling its duration.
    ///
    /// Decodes a handful of frames for the duration probes and leaves the
    /// decoder at the start of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`StillframeError::IoError`] if the file size cannot be read.
    pub fn info(&mut self) -> Result<VideoInfo, StillframeError> {
        let size_bytes = fs::metadata(&self.path)?.len();
        let duration = reconcile(self);
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(VideoInfo {
            path: self.path.clone(),
            file_name,
            total_frames: self.properties.total_frame_count,
            frames_per_second: self.properties.reported_frame_rate,
            width: self.properties.width,
            height: self.properties.height,
            codec: self.codec.clone(),
            duration,
            size_bytes,
        })
    }

    /// Extract the frames selected by `window` and `options` into
    /// `output_dir`, creating it if needed.
    ///
    /// See [`extract_to_sink`] for the stopping rules.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created, the plan cannot be computed,
    /// or a frame cannot be written. Decode failures partway through are
    /// reported in the returned [`ExtractionReport`] instead.
    pub fn extract_to_directory<P: AsRef<Path>>(
        &mut self,
        output_dir: P,
        window: &TimeWindow,
        options: &ExtractOptions,
    ) -> Result<ExtractionReport, StillframeError> {
        let mut writer =
            DirectoryWriter::create(output_dir, options.output_format, options.quality)?;
        extract_to_sink(self, window, &mut writer, options)
    }

    fn start_offset_micros(&self) -> i64 {
        let seconds = conversion::pts_to_seconds(self.start_pts, self.time_base);
        (seconds * 1_000_000.0) as i64
    }

    fn reset_decoder(&mut self) {
        self.decoder.flush();
        self.eof_sent = false;
        self.resync = true;
    }

    /// Index and time of the frame currently in `decoded_frame`.
    fn decoded_position(&self) -> (u64, Option<f64>) {
        let pts = self
            .decoded_frame
            .timestamp()
            .or_else(|| self.decoded_frame.pts());
        let seconds =
            pts.map(|pts| conversion::pts_to_seconds(pts - self.start_pts, self.time_base));
        let frames_per_second = self.properties.reported_frame_rate;
        let derived = seconds
            .filter(|_| frames_per_second > 0.0)
            .map(|seconds| conversion::seconds_to_nearest_frame(seconds, frames_per_second));
        let index = conversion::monotonic_frame_index(derived, self.next_index, self.resync);
        (index, seconds)
    }

    fn convert_decoded_frame(&mut self) -> Result<DynamicImage, StillframeError> {
        self.scaler
            .run(&self.decoded_frame, &mut self.rgb_frame)
            .map_err(|error| {
                StillframeError::VideoDecodeError(format!("pixel conversion failed: {error}"))
            })?;
        let image = conversion::rgb_frame_to_image(
            &self.rgb_frame,
            self.properties.width,
            self.properties.height,
        )?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl DecodeSource for VideoFile {
    fn properties(&self) -> SourceProperties {
        self.properties
    }

    fn end_position(&mut self) -> Option<f64> {
        let container_duration = self.input_context.duration();
        if container_duration <= 0 {
            return None;
        }

        let end = container_duration + self.start_offset_micros();
        if let Err(error) = self.input_context.seek(end, ..end) {
            log::debug!("End seek failed, using container duration: {error}");
            return Some(conversion::container_duration_to_seconds(container_duration));
        }
        self.reset_decoder();

        // Walk the packets after the last keyframe to find where the stream stops.
        let mut stream_end: Option<i64> = None;
        let mut packet = Packet::empty();
        while packet.read(&mut self.input_context).is_ok() {
            if packet.stream() != self.video_stream_index {
                continue;
            }
            if let Some(pts) = packet.pts() {
                let packet_end = pts + packet.duration().max(0);
                stream_end = Some(stream_end.map_or(packet_end, |end| end.max(packet_end)));
            }
        }

        match stream_end {
            Some(end) => Some(conversion::pts_to_seconds(end - self.start_pts, self.time_base)),
            None => Some(conversion::container_duration_to_seconds(container_duration)),
        }
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), StillframeError> {
        let frames_per_second = self.properties.reported_frame_rate;
        let target = if frame_index == 0 {
            0
        } else if frames_per_second > 0.0 {
            conversion::frame_index_to_seek_timestamp(frame_index, frames_per_second)
        } else {
            return Err(StillframeError::UnknownFrameRate);
        };
        let target = target + self.start_offset_micros();

        self.input_context.seek(target, ..target)?;
        self.reset_decoder();
        self.next_index = frame_index;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<Option<DecodedFrame>, StillframeError> {
        loop {
            let received = self.decoder.receive_frame(&mut self.decoded_frame);
            match classify_receive(received)? {
                Received::Frame => {
                    let (index, reported_time) = self.decoded_position();
                    self.next_index = index + 1;
                    self.resync = false;
                    let image = self.convert_decoded_frame()?;
                    return Ok(Some(DecodedFrame {
                        index,
                        reported_time,
                        image,
                    }));
                }
                Received::NeedsInput => {}
                Received::Drained => return Ok(None),
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            StillframeError::VideoDecodeError(format!(
                                "decoder rejected packet: {error}"
                            ))
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    return Err(StillframeError::VideoDecodeError(format!(
                        "failed to read packet: {error}"
                    )));
                }
            }
        }
    }
}

/// What `receive_frame` produced.
#[derive(Debug, PartialEq, Eq)]
enum Received {
    Frame,
    NeedsInput,
    Drained,
}

/// Split a `receive_frame` result into a frame, a request for more packets,
/// or end of stream. Any other error is a decode failure.
fn classify_receive(result: Result<(), FfmpegError>) -> Result<Received, StillframeError> {
    match result {
        Ok(()) => Ok(Received::Frame),
        Err(FfmpegError::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
            Ok(Received::NeedsInput)
        }
        Err(FfmpegError::Eof) => Ok(Received::Drained),
        Err(error) => Err(StillframeError::VideoDecodeError(format!(
            "failed to decode frame: {error}"
        ))),
    }
}

/// Open `input`, extract the selected frames into `output_dir`, and close it.
///
/// The decoder is released before this returns, on success, failure, and
/// cancellation alike.
///
/// # Errors
///
/// Everything [`VideoFile::open`] and [`VideoFile::extract_to_directory`]
/// return.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use stillframe::{ExtractOptions, StillframeError, TimeWindow};
///
/// let window = TimeWindow::new(Duration::ZERO, Some(Duration::from_secs(5)));
/// let report = stillframe::extract_frames("input.mp4", "frames", &window, &ExtractOptions::new())?;
/// println!("{} frame(s), {}", report.frames_written, report.stop_reason);
/// # Ok::<(), StillframeError>(())
/// ```
pub fn extract_frames<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    window: &TimeWindow,
    options: &ExtractOptions,
) -> Result<ExtractionReport, StillframeError> {
    let mut video = VideoFile::open(input)?;
    video.extract_to_directory(output_dir, window, options)
}
