//! Track features through a directory of frames
//!
//! Usage:
//!   glimpse <FRAMES_DIR> [--viewer rerun|save|none|window]
//!
//! Extract frames from a video first, e.g. `ffmpeg -i video.mp4 frames/%06d.png`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glimpse::{run, ImageDirectorySource, NullRenderer, Renderer, RerunRenderer, RunError};
use glimpse_frontend::{DistanceMetric, FeatureTracker, TrackerConfig};
use log::info;

/// Monocular feature tracking between consecutive frames
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory of frames, processed in file name order
    frames: PathBuf,

    /// Tracker configuration as JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Working width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Working height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<usize>,

    /// Where to show the tracked frames
    #[arg(long, value_enum, default_value_t = Viewer::Rerun)]
    viewer: Viewer,

    /// Recording path for `--viewer save`
    #[arg(long, default_value = "glimpse.rrd")]
    rrd: PathBuf,

    /// Keep only mutual best matches
    #[arg(long)]
    cross_check: bool,

    /// Descriptor distance
    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// Draw match lines on the displayed frames
    #[arg(long)]
    draw_matches: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Viewer {
    /// Spawn a Rerun viewer
    Rerun,
    /// Write a Rerun recording to `--rrd`
    Save,
    /// Track without showing anything
    None,
    /// Native window, closed with Escape (needs the `window` feature)
    Window,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Metric {
    Hamming,
    L2,
}

impl From<Metric> for DistanceMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Hamming => DistanceMetric::Hamming,
            Metric::L2 => DistanceMetric::L2,
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run_app(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app(args: Args) -> Result<(), RunError> {
    let config = effective_config(&args)?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut tracker = FeatureTracker::new(config)?;
    let mut source = ImageDirectorySource::open(&args.frames)?;
    info!("{} frames in {}", source.len(), args.frames.display());

    let mut renderer = make_renderer(&args, tracker.config())?;
    let summary = run(&mut tracker, &mut source, renderer.as_mut(), args.max_frames)?;

    println!("Frames processed: {}", summary.frames);
    println!("Mean keypoints:   {:.1}", summary.mean_keypoints());
    println!("Mean matches:     {:.1}", summary.mean_matches());
    println!("Elapsed:          {:.2?} ({:.1} fps)", summary.elapsed, summary.fps());
    if summary.quit_requested {
        println!("Stopped by viewer");
    }

    Ok(())
}

/// Configuration file (or defaults) with command line overrides applied
fn effective_config(args: &Args) -> Result<TrackerConfig, RunError> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::from_json_file(path)?,
        None => TrackerConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(metric) = args.metric {
        config.distance_metric = metric.into();
    }
    if args.cross_check {
        config.cross_check = true;
    }
    if args.draw_matches {
        config.draw_matches = true;
    }

    Ok(config)
}

fn make_renderer(args: &Args, config: &TrackerConfig) -> Result<Box<dyn Renderer>, RunError> {
    let renderer: Box<dyn Renderer> = match args.viewer {
        Viewer::Rerun => Box::new(RerunRenderer::spawn("glimpse")?),
        Viewer::Save => Box::new(RerunRenderer::save("glimpse", &args.rrd)?),
        Viewer::None => Box::new(NullRenderer::new()),
        #[cfg(feature = "window")]
        Viewer::Window => Box::new(glimpse::WindowRenderer::new(
            "Glimpse",
            config.width,
            config.height,
        )?),
        #[cfg(not(feature = "window"))]
        Viewer::Window => {
            return Err(RunError::Render("built without the `window` feature".to_string()))
        }
    };
    info!("viewer {:?} at {}x{}", args.viewer, config.width, config.height);
    Ok(renderer)
}
