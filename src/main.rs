use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use ball_trace::{Checkpoint, FfmpegVideo, Progress, Settings, TraceConfig, TracePipeline, VisionApiTracker};
use clap::Parser;
use tracing::{Level, debug};

#[derive(Parser, Debug)]
#[command(
    name = "ball-trace",
    about = "Track the moving ball in a video and draw a fading motion trace"
)]
struct Args {
    /// Video to process (.mp4)
    input: Option<PathBuf>,
    /// Output FPS (1-30)
    #[arg(long, default_value_t = 15)]
    fps: u32,
    /// Motion sensitivity, lower is more sensitive (0.001-0.05)
    #[arg(long, default_value_t = 0.001)]
    movement_thresh: f32,
    /// Min detection confidence, 0 accepts all and 1 is very strict
    #[arg(long = "confidence", default_value_t = 0.99)]
    confidence_thresh: f32,
    /// Trace tail length (5-100)
    #[arg(long, default_value_t = 30)]
    tail_len: usize,
    /// Object prompt sent to the tracking service
    #[arg(long, default_value = "Ball")]
    label: String,
    /// Track and filter without drawing the trace
    #[arg(long)]
    no_trace: bool,
    /// Settings file (defaults to ./ball_trace.toml when present)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn trace_config(&self) -> TraceConfig {
        TraceConfig {
            fps: self.fps,
            movement_thresh: self.movement_thresh,
            confidence_thresh: self.confidence_thresh,
            tail_len: self.tail_len,
            label: self.label.clone(),
            show_trace: !self.no_trace,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = Settings::load(args.settings.as_deref()).context("failed to load VisionAgent settings")?;
    debug!(?settings, "loaded settings");

    let config = args.trace_config();
    config.validate()?;

    let video = FfmpegVideo::with_binaries(args.ffmpeg.clone(), args.ffprobe.clone());
    let tracker = VisionApiTracker::new(&settings);
    let mut pipeline = TracePipeline::new(video.clone(), tracker, video).with_api_key(settings.api_key());

    let mut shown: Option<Checkpoint> = None;
    let progress = pipeline.process(args.input.as_deref(), &config, |progress: &Progress| {
        if progress.last() != shown {
            if let Some(checkpoint) = progress.last() {
                println!("[x] {}", checkpoint.description());
            }
            shown = progress.last();
        }
    });

    match progress.video {
        Some(path) => {
            println!("Annotated video written to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}
