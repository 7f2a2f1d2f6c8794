use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use traffic_tally::video::{DEFAULT_FOURCC, default_output_path};
use traffic_tally::{
    Annotator, CancellationToken, Completion, DetectionLog, DetectionOracle, LogDetector,
    LogStatus, ReplayOracle, SessionConfig, SessionDriver, SessionReport, TallyEngine,
    TrackingOracle, VideoReader, VideoWriter,
};

/// Count unique vehicles, cyclists and pedestrians in a traffic video and
/// write an annotated copy.
///
/// Type `stop` (or `q`) and Enter while it runs to finish early with a
/// partial output.
#[derive(Debug, Parser)]
#[command(name = "traffic-tally", version)]
struct Args {
    /// Input video (.mp4, .avi, .mov, ...)
    input: PathBuf,

    /// Detections for the input, JSON Lines with one object per frame
    #[arg(long, short)]
    detections: PathBuf,

    /// Use track ids recorded in the detection log instead of running ByteTrack
    #[arg(long)]
    pretracked: bool,

    /// Output video; defaults to <input>_processed_<timestamp>.mp4
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON session config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Send every Nth frame to the detector
    #[arg(long)]
    stride: Option<u32>,

    /// Minimum confidence for a detection to be counted
    #[arg(long)]
    confidence: Option<f32>,

    /// Draw each track's recent path
    #[arg(long)]
    trails: bool,

    /// TrueType/OpenType font for box labels instead of the bundled one
    #[arg(long)]
    font: Option<PathBuf>,

    /// Keep the latest annotated frame at this path
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write a JSON summary of the run
    #[arg(long)]
    report: Option<PathBuf>,

    /// FourCC of the output encoder, e.g. mp4v, avc1 or MJPG
    #[arg(long, default_value = DEFAULT_FOURCC)]
    fourcc: String,

    /// Do not watch stdin for stop commands
    #[arg(long)]
    no_stdin: bool,
}

fn session_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(stride) = args.stride {
        anyhow::ensure!(stride > 0, "--stride must be at least 1");
        config.frame_stride = stride;
    }
    if let Some(confidence) = args.confidence {
        config.tally.confidence_threshold = confidence;
    }
    config.draw_trails |= args.trails;
    Ok(config)
}

fn watch_stdin(cancel: CancellationToken) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if matches!(line.trim(), "stop" | "q") {
                cancel.cancel();
                break;
            }
        }
    });
}

fn run<O>(args: &Args, config: SessionConfig, mut oracle: O) -> anyhow::Result<()>
where
    O: DetectionOracle,
    O::Error: std::error::Error + Send + Sync + 'static,
{
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, &chrono::Local::now().naive_local()));

    let mut annotator = Annotator::new();
    if let Some(font) = &args.font {
        annotator = annotator.with_font(Annotator::load_font(font)?);
    }

    let mut status = LogStatus::new();
    if let Some(preview) = &args.preview {
        status = status.with_preview(preview.clone());
    }

    let cancel = CancellationToken::new();
    if !args.no_stdin {
        watch_stdin(cancel.clone());
    }

    let mut engine = TallyEngine::new(config.tally.clone());
    let driver = SessionDriver::new(config, annotator);
    let source = VideoReader::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let outcome = driver
        .run(
            source,
            |info| VideoWriter::create(&output, info, &args.fourcc),
            &mut oracle,
            &mut engine,
            &mut status,
            &cancel,
        )
        .context("processing video")?;

    match outcome.completion {
        Completion::Complete => println!("Processing complete: {}", output.display()),
        Completion::Partial => println!(
            "Processing stopped early; partial video saved to {}",
            output.display()
        ),
    }
    println!("{}", outcome.snapshot);

    if let Some(path) = &args.report {
        let report = SessionReport::new(args.input.clone(), output.clone(), outcome, &engine);
        write_report(path, &report)?;
    }
    Ok(())
}

fn write_report(path: &Path, report: &SessionReport) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating report {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = session_config(&args)?;
    let log = DetectionLog::open(&args.detections)
        .with_context(|| format!("reading detections {}", args.detections.display()))?;
    tracing::info!(frames = log.len(), "loaded detection log");

    if args.pretracked {
        run(&args, config, ReplayOracle::new(log))
    } else {
        let tracker_config = config.tracker.clone();
        run(
            &args,
            config,
            TrackingOracle::new(LogDetector::new(log), tracker_config),
        )
    }
}
