use std::{
    error::Error,
    path::PathBuf,
    sync::{Arc, atomic::AtomicBool},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use signal_hook::consts::{SIGINT, SIGTERM};
use stillframe::{
    CancellationToken, ExtractOptions, FfmpegLogLevel, ImageOutputFormat, ProgressCallback,
    ProgressInfo, SamplingRate, StopReason, TimeWindow, ValidationReport, VideoFile, VideoInfo,
    VideoProbe,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillframe info input.mp4 --json\n  stillframe extract input.mp4 -o frames -r 2 -s 0 -e 5 --progress\n  stillframe extract input.mkv -o frames --format jpg -q 90 -s 1:30 -e 2:00\n  stillframe validate input.mp4\n  stillframe completions zsh > _stillframe";

#[derive(Debug, Parser)]
#[command(
    name = "stillframe",
    version,
    about = "Extract time-indexed still frames from video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames into an output directory.
    #[command(
        about = "Extract still frames",
        after_help = "Examples:\n  stillframe extract input.mp4 -o frames\n  stillframe extract input.mp4 -o frames -r 1 -s 00:00:10 -e 00:00:20 --progress"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Output directory for frame images (created if missing).
        #[arg(short, long)]
        out: PathBuf,
        /// Frames per second to keep. Omit to keep every frame.
        #[arg(short, long)]
        rate: Option<f64>,
        /// Window start, in seconds or [hh:]mm:ss[.fff].
        #[arg(short, long, default_value = "0")]
        start: String,
        /// Window end (inclusive), in seconds or [hh:]mm:ss[.fff]. 0 or omitted means the end of the video.
        #[arg(short, long)]
        end: Option<String>,
        /// Output quality: PNG compression level 0-9, or JPEG quality 1-100.
        #[arg(short, long)]
        quality: Option<u8>,
        /// Output image format (png, jpg, bmp, tiff).
        #[arg(long, default_value = "png")]
        format: String,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Print the extraction report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print video information, including every duration estimate.
    #[command(
        about = "Print video information",
        visible_alias = "probe",
        after_help = "Examples:\n  stillframe info input.mp4\n  stillframe info input.mp4 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,

        /// Output information as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate a video and print a report.
    #[command(
        about = "Validate video file",
        after_help = "Examples:\n  stillframe validate input.mp4"
    )]
    Validate {
        /// Input video path.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return to_duration(seconds, trimmed);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    to_duration(total_seconds, trimmed)
}

fn to_duration(seconds: f64, original: &str) -> Result<Duration, Box<dyn Error>> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("time must be a non-negative number: {original}").into());
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| Box::<dyn Error>::from(format!("time out of range: {original} ({error})")))
}

/// `--end 0` keeps the whole remainder of the video. An end before the
/// start is passed through and selects no frames.
fn parse_window(start: &str, end: Option<&str>) -> Result<TimeWindow, Box<dyn Error>> {
    let start = parse_timecode(start)?;
    let end = end
        .map(parse_timecode)
        .transpose()?
        .filter(|end| !end.is_zero());

    let window = TimeWindow::new(start, end);
    if window.is_empty_interval() {
        log::warn!(
            "--end is not after --start ({:.3}s); no frames will be selected",
            start.as_secs_f64()
        );
    }
    Ok(window)
}

fn init_logging(global: &GlobalOptions) {
    let default_level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        stillframe::set_ffmpeg_log_level(parsed);
    } else if !global.verbose {
        stillframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    }
    Ok(())
}

/// Cancel on the first Ctrl-C so the frames written so far are kept; a
/// second one exits immediately.
fn interrupt_token() -> Result<CancellationToken, Box<dyn Error>> {
    let flag = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(signal, 130, Arc::clone(&flag))?;
        signal_hook::flag::register(signal, Arc::clone(&flag))?;
    }
    Ok(CancellationToken::from_flag(flag))
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(planned: u64) -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(planned);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.planned_count);
        self.bar.set_position(info.selected_count);
        self.bar.set_message(format!(
            "{:.3}s ({:.0}% of window)",
            info.timestamp.as_secs_f64(),
            info.percent_of_window
        ));
    }
}

fn print_info(info: &VideoInfo, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        let candidates: serde_json::Map<String, serde_json::Value> = info
            .duration
            .candidate_methods
            .iter()
            .map(|(method, seconds)| (method.name().to_string(), json!(seconds)))
            .collect();
        let payload = json!({
            "file_name": info.file_name,
            "path": info.path.display().to_string(),
            "total_frames": info.total_frames,
            "fps": info.frames_per_second,
            "width": info.width,
            "height": info.height,
            "codec": info.codec,
            "duration_seconds": info.duration.seconds,
            "duration_candidates": candidates,
            "size_bytes": info.size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("File: {}", info.file_name);
    println!("Frames: {}", info.total_frames);
    println!("FPS: {:.3}", info.frames_per_second);
    println!("Resolution: {}x{} [{}]", info.width, info.height, info.codec);
    match info.duration() {
        Some(duration) => println!("Duration: {:.3}s", duration.as_secs_f64()),
        None => println!("Duration: {}", "unknown".yellow()),
    }
    for (method, seconds) in &info.duration.candidate_methods {
        println!("  {method}: {seconds:.3}s");
    }
    if info.duration.has_disagreement() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "duration estimates differ by {:.3}s",
                info.duration.spread()
            )
            .yellow()
        );
    }
    println!("Size: {:.2} MB", info.size_megabytes());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_extract(
    input: PathBuf,
    out: PathBuf,
    rate: Option<f64>,
    start: &str,
    end: Option<&str>,
    quality: Option<u8>,
    format: &str,
    show_progress: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let window = parse_window(start, end)?;
    let format: ImageOutputFormat = format.parse()?;
    let sampling_rate = rate.map_or(SamplingRate::AllFrames, SamplingRate::PerSecond);
    sampling_rate.validate()?;

    let mut video = VideoFile::open(&input)?;

    let mut options = ExtractOptions::new()
        .with_sampling_rate(sampling_rate)
        .with_output_format(format)
        .with_cancellation(interrupt_token()?);
    if let Some(quality) = quality {
        options = options.with_quality(quality);
    }

    let progress = if show_progress {
        let progress = Arc::new(TerminalProgress::new(0)?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let report = video.extract_to_directory(&out, &window, &options)?;
    drop(video);

    if let Some(progress) = &progress {
        progress.bar.finish_and_clear();
    }

    if as_json {
        let payload = json!({
            "input": input.display().to_string(),
            "output_dir": out.display().to_string(),
            "start_frame": report.plan.start_frame_index(),
            "end_frame": report.plan.end_frame_index_inclusive(),
            "stride": report.plan.frame_stride(),
            "planned": report.plan.selected_count(),
            "frames_written": report.frames_written,
            "duration_seconds": report.estimate.seconds,
            "stop_reason": report.stop_reason.to_string(),
            "frames": report.identities,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    match &report.stop_reason {
        StopReason::Completed => println!(
            "{} {} frame(s) to {}",
            "saved".green().bold(),
            report.frames_written,
            out.display()
        ),
        StopReason::Cancelled => eprintln!(
            "{} {}",
            "cancelled:".yellow().bold(),
            format!(
                "{} of {} frame(s) saved to {}",
                report.frames_written,
                report.plan.selected_count(),
                out.display()
            )
            .yellow()
        ),
        StopReason::DecodeFailed(reason) => eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "decoding stopped early ({reason}); {} frame(s) saved to {}",
                report.frames_written,
                out.display()
            )
            .yellow()
        ),
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Extract {
            input,
            out,
            rate,
            start,
            end,
            quality,
            format,
            progress,
            json,
        } => run_extract(
            input,
            out,
            rate,
            &start,
            end.as_deref(),
            quality,
            &format,
            progress,
            json,
        )?,
        Commands::Info { input, json } => {
            let info = VideoProbe::probe(&input)?;
            print_info(&info, json)?;
        }
        Commands::Validate { input } => {
            let info = VideoProbe::probe(&input)?;
            let report = ValidationReport::from_info(&info);
            print!("{report}");
            if report.is_valid() {
                println!("{}", "valid".green().bold());
            } else {
                return Err(format!("{} error(s) found", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_timecode, parse_window};

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("75").unwrap().as_secs(), 75);
        assert_eq!(parse_timecode("01:15").unwrap().as_secs(), 75);
        assert_eq!(
            parse_timecode("00:01:15.5").unwrap(),
            Duration::from_millis(75_500)
        );
        assert_eq!(parse_timecode("2.25").unwrap(), Duration::from_millis(2_250));
    }

    #[test]
    fn parse_timecode_rejects_garbage() {
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("-3").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("ab:cd").is_err());
        assert!(parse_timecode("1e20").is_err());
    }

    #[test]
    fn zero_end_means_open_window() {
        let window = parse_window("1", Some("0")).unwrap();
        assert_eq!(window.start, Duration::from_secs(1));
        assert_eq!(window.end, None);
    }

    #[test]
    fn end_before_start_selects_nothing() {
        let window = parse_window("10", Some("5")).unwrap();
        assert_eq!(window.end, Some(Duration::from_secs(5)));
        assert!(window.is_empty_interval());
        assert!(parse_window("5", Some("5")).unwrap().is_empty_interval());
        assert!(!parse_window("5", Some("6")).unwrap().is_empty_interval());
    }
}
