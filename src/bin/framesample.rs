use std::{
    ops::ControlFlow,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesample::{
    ExportJob, FfmpegOpener, FfmpegSource, FrameSampler, PlanRounding, ProgressInfo,
    SamplerError, SamplerObserver, SamplerOptions, SkipPolicy, VideoMetadata, VideoSource,
};
use image::{ImageFormat, imageops::FilterType};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesample inspect input.mp4 --json\n  framesample export input.mp4 --out frames --count 50 --width 640 --height 360 --progress\n  framesample plan 1000 8\n  framesample completions zsh > _framesample";

#[derive(Debug, Parser)]
#[command(
    name = "framesample",
    version,
    about = "Sample evenly spaced still frames from a video into a numbered image sequence",
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
    /// More logging output (repeat for debug and trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video metadata.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framesample inspect input.mp4\n  framesample inspect input.mp4 --json"
    )]
    Inspect {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the frame indices a sampling run would read.
    #[command(about = "Show a sampling plan")]
    Plan {
        /// Number of frames in the source.
        total_frames: u64,
        /// Number of frames to sample.
        count: u32,
        /// Index rounding: nearest | floor.
        #[arg(long, default_value = "nearest")]
        rounding: String,
        /// Output the plan as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Sample frames into an output directory.
    #[command(
        about = "Export sampled frames",
        after_help = "Examples:\n  framesample export input.mp4 --out frames\n  framesample export input.mp4 --out frames --count 12 --width 320 --height 180 --ext jpg --strict"
    )]
    Export {
        /// Input video path.
        input: PathBuf,
        /// Output directory. Regular files already in it are removed.
        #[arg(long)]
        out: PathBuf,
        /// Output width in pixels (defaults to the source width).
        #[arg(long)]
        width: Option<u32>,
        /// Output height in pixels (defaults to the source height).
        #[arg(long)]
        height: Option<u32>,
        /// Number of frames to sample.
        #[arg(long, default_value_t = 50)]
        count: u32,
        /// Output image extension (png, jpg, jpeg, bmp, tiff, webp).
        #[arg(long, default_value = "png")]
        ext: String,
        /// Resize filter: nearest | triangle | catmull-rom | gaussian | lanczos3.
        #[arg(long, default_value = "triangle")]
        filter: String,
        /// Index rounding: nearest | floor.
        #[arg(long, default_value = "nearest")]
        rounding: String,
        /// Fail on the first frame that cannot be exported.
        #[arg(long)]
        strict: bool,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_image_format(value: &str) -> Option<ImageFormat> {
    match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "bmp" => Some(ImageFormat::Bmp),
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

fn parse_filter(value: &str) -> Option<FilterType> {
    match value.to_ascii_lowercase().as_str() {
        "nearest" => Some(FilterType::Nearest),
        "triangle" | "bilinear" | "linear" => Some(FilterType::Triangle),
        "catmull-rom" | "catmullrom" | "cubic" => Some(FilterType::CatmullRom),
        "gaussian" => Some(FilterType::Gaussian),
        "lanczos3" | "lanczos" => Some(FilterType::Lanczos3),
        _ => None,
    }
}

fn parse_rounding(value: &str) -> Option<PlanRounding> {
    match value.to_ascii_lowercase().as_str() {
        "nearest" | "round" => Some(PlanRounding::Nearest),
        "floor" | "truncate" => Some(PlanRounding::Floor),
        _ => None,
    }
}

fn level_filter(global: &GlobalOptions) -> LevelFilter {
    if global.quiet {
        return LevelFilter::Error;
    }
    match global.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(global: &GlobalOptions) {
    let level = level_filter(global);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    framesample::set_ffmpeg_log_level(level);
}

fn install_interrupt_flag() -> Result<Arc<AtomicBool>, Box<dyn std::error::Error>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;
    Ok(interrupted)
}

/// Prints sampler output to the terminal and stops on Ctrl-C.
struct TerminalObserver {
    progress_bar: Option<ProgressBar>,
    interrupted: Arc<AtomicBool>,
    echo_info: bool,
}

impl TerminalObserver {
    fn print(&self, line: &str) {
        match &self.progress_bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

/// Errors and warnings with their coloured prefix; `None` for other levels.
fn problem_line(level: Level, line: &str) -> Option<String> {
    match level {
        Level::Error => Some(format!("{} {}", "error:".red().bold(), line.red())),
        Level::Warn => Some(format!("{} {}", "warning:".yellow().bold(), line.yellow())),
        _ => None,
    }
}

impl SamplerObserver for TerminalObserver {
    fn on_log(&mut self, level: Level, line: &str) {
        match problem_line(level, line) {
            Some(problem) => self.print(&problem),
            None if self.echo_info => self.print(line),
            None => log::debug!("{line}"),
        }
    }

    fn on_progress(&mut self, info: &ProgressInfo) -> ControlFlow<()> {
        if let Some(bar) = &self.progress_bar {
            bar.set_position(u64::from(info.done));
        }
        if self.interrupted.load(Ordering::SeqCst) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// A dimension given as 0 on the command line is rejected before the source
/// is opened to fill in the other one.
fn check_dimensions(width: Option<u32>, height: Option<u32>) -> Result<(), SamplerError> {
    for (field, value) in [("width", width), ("height", height)] {
        if value == Some(0) {
            return Err(SamplerError::InvalidJob {
                field,
                reason: "must be greater than zero".to_string(),
            });
        }
    }
    Ok(())
}

fn print_metadata(metadata: &VideoMetadata, json: bool) {
    if json {
        let payload = json!({
            "width": metadata.width,
            "height": metadata.height,
            "frames_per_second": metadata.frames_per_second,
            "total_frames": metadata.total_frames,
            "duration_seconds": metadata.duration_seconds(),
            "codec": metadata.codec,
        });
        println!("{payload:#}");
        return;
    }

    println!("{}", "Video info:".bold());
    println!("  Original size: {}x{}", metadata.width, metadata.height);
    println!("  Total frames:  {}", metadata.total_frames);
    println!("  FPS:           {:.2}", metadata.frames_per_second);
    println!("  Duration:      {:.2} seconds", metadata.duration_seconds());
    println!("  Codec:         {}", metadata.codec);
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Inspect { input, json } => {
            let source = FfmpegSource::open(&input)?;
            let metadata = source.metadata();
            print_metadata(metadata, json);
            if !metadata.has_frames() && !json {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    "no frames reported; this video cannot be sampled".yellow()
                );
            }
        }
        Commands::Plan {
            total_frames,
            count,
            rounding,
            json,
        } => {
            let rounding = parse_rounding(&rounding)
                .ok_or(format!("unsupported --rounding: {rounding}"))?;
            let plan = framesample::build_plan(total_frames, count, rounding)?;
            if json {
                println!("{}", json!(plan.indices()));
            } else {
                for (sequence, frame_index) in plan.sequenced() {
                    println!("{sequence:>4}  {frame_index}");
                }
            }
        }
        Commands::Export {
            input,
            out,
            width,
            height,
            count,
            ext,
            filter,
            rounding,
            strict,
            progress,
            json,
        } => {
            let format = parse_image_format(&ext).ok_or(format!("unsupported --ext: {ext}"))?;
            let filter = parse_filter(&filter).ok_or(format!("unsupported --filter: {filter}"))?;
            let rounding = parse_rounding(&rounding)
                .ok_or(format!("unsupported --rounding: {rounding}"))?;
            let policy = if strict {
                SkipPolicy::Abort
            } else {
                SkipPolicy::Continue
            };

            // Missing dimensions fall back to the source size.
            check_dimensions(width, height)?;
            let (width, height) = match (width, height) {
                (Some(width), Some(height)) => (width, height),
                (width, height) => {
                    let source = FfmpegSource::open(&input)?;
                    let metadata = source.metadata();
                    (
                        width.unwrap_or(metadata.width),
                        height.unwrap_or(metadata.height),
                    )
                }
            };

            let options = SamplerOptions::new()
                .with_image_format(format)
                .with_filter(filter)
                .with_rounding(rounding)
                .with_skip_policy(policy);
            let sampler = FrameSampler::new(options);
            let job = ExportJob::new(&input, &out, width, height, count);

            let progress_bar = if progress {
                let bar = ProgressBar::new(u64::from(count));
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {eta} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                Some(bar)
            } else {
                None
            };

            let mut observer = TerminalObserver {
                progress_bar,
                interrupted: install_interrupt_flag()?,
                echo_info: cli.global.verbose > 0,
            };

            let outcome = sampler.run(&job, &FfmpegOpener, &mut observer);
            if let Some(bar) = observer.progress_bar.take() {
                match &outcome {
                    Ok(_) => bar.finish_with_message("done"),
                    Err(_) => bar.abandon(),
                }
            }
            let summary = outcome?;

            if json {
                let payload = json!({
                    "output_dir": summary.output_dir.display().to_string(),
                    "written": summary.written,
                    "skipped": summary.skipped,
                    "skipped_sequences": summary.skipped_sequences,
                    "extension": sampler.options().extension(),
                });
                println!("{payload:#}");
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Wrote {} frame(s) to {} ({} skipped)",
                        summary.written,
                        summary.output_dir.display(),
                        summary.skipped
                    )
                    .green()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesample", &mut std::io::stdout());
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
