use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use framestep::{
    FfmpegLogLevel, FfmpegSource, PixelFormat, PlaybackOptions, StreamDescriptor, VideoSource,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Keys:\n  space      play / pause\n  n, right   next frame\n  b, left    previous frame\n  s / p      play / pause\n  w          save snapshot\n  q, esc     quit\n\nExamples:\n  framestep input.avi\n  framestep input.mp4 --start-frame 250 --play\n  framestep input.mkv --info --json\n\nPlayback opens an OpenCV window and needs a build with `--features window`;\n--info works in every build.";

#[derive(Debug, Parser)]
#[command(
    name = "framestep",
    version,
    about = "Frame-accurate video player",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video path.
    input: PathBuf,

    /// Frame shown at startup.
    #[arg(long, default_value_t = 0)]
    start_frame: u64,

    /// Start playing immediately instead of paused.
    #[arg(long)]
    play: bool,

    /// Display pixel format (rgb8, rgba8, gray8).
    #[arg(long, default_value = "rgb8")]
    pixel_format: String,

    /// Directory snapshots are written to.
    #[arg(long, default_value = ".")]
    snapshot_dir: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, default_value = "error")]
    log_level: String,

    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,

    /// Print stream information and exit.
    #[arg(long)]
    info: bool,

    /// Print stream information as JSON (with --info).
    #[arg(long, requires = "info")]
    json: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn print_info(path: &Path, descriptor: &StreamDescriptor, as_json: bool) {
    if as_json {
        let info = json!({
            "path": path.display().to_string(),
            "stream_index": descriptor.stream_index,
            "codec": descriptor.codec,
            "width": descriptor.width,
            "height": descriptor.height,
            "frame_rate": format!(
                "{}/{}",
                descriptor.frame_rate.numerator(),
                descriptor.frame_rate.denominator()
            ),
            "frames_per_second": descriptor.frames_per_second(),
            "time_base": format!(
                "{}/{}",
                descriptor.time_base.numerator(),
                descriptor.time_base.denominator()
            ),
            "duration_seconds": descriptor.duration.as_secs_f64(),
            "frame_count": descriptor.frame_count,
        });
        println!("{info:#}");
        return;
    }

    println!("{} {}", "file".cyan().bold(), path.display());
    println!(
        "{} #{} {} {}x{}",
        "video".cyan().bold(),
        descriptor.stream_index,
        descriptor.codec,
        descriptor.width,
        descriptor.height,
    );
    println!(
        "{} {:.3} fps (time base {}/{})",
        "timing".cyan().bold(),
        descriptor.frames_per_second(),
        descriptor.time_base.numerator(),
        descriptor.time_base.denominator(),
    );
    println!(
        "{} {:.2}s, ~{} frames",
        "length".cyan().bold(),
        descriptor.duration.as_secs_f64(),
        descriptor.frame_count,
    );
}

#[cfg(feature = "window")]
fn play(source: FfmpegSource, options: PlaybackOptions) -> Result<(), Box<dyn std::error::Error>> {
    let window = framestep::HighGuiWindow::new(options.window_title())?;
    framestep::PlaybackController::new(source, window, options).run()?;
    Ok(())
}

#[cfg(not(feature = "window"))]
fn play(_source: FfmpegSource, _options: PlaybackOptions) -> Result<(), Box<dyn std::error::Error>> {
    Err("framestep was built without the `window` feature; rebuild with `--features window` or use --info".into())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let log_level: FfmpegLogLevel = cli.log_level.parse()?;
    framestep::set_ffmpeg_log_level(log_level);
    let pixel_format: PixelFormat = cli.pixel_format.parse()?;

    let source = FfmpegSource::open(&cli.input)?;
    if cli.info {
        print_info(&cli.input, source.descriptor(), cli.json);
        return Ok(());
    }

    let file_name = cli
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "framestep".to_string());

    let options = PlaybackOptions::new()
        .with_start_frame(cli.start_frame)
        .with_autoplay(cli.play)
        .with_pixel_format(pixel_format)
        .with_snapshot_dir(cli.snapshot_dir)
        .with_window_title(format!("{file_name} (q to quit)"));

    play(source, options)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
