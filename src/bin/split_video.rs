use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use traffic_tally::split::{FfmpegTools, split_video};

/// Split a video into a number of equal-length segments.
#[derive(Debug, Parser)]
#[command(name = "split-video", version)]
struct Args {
    /// Path to the input video file
    video_path: PathBuf,

    /// Directory where the segments are written
    output_dir: PathBuf,

    /// Number of equal-length segments
    num_parts: u32,

    #[arg(long, env = "FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    #[arg(long, env = "FFPROBE", default_value = "ffprobe")]
    ffprobe: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let tools = FfmpegTools {
        ffmpeg: args.ffmpeg,
        ffprobe: args.ffprobe,
    };

    let total = args.num_parts;
    split_video(&tools, &args.video_path, &args.output_dir, total, |segment, path| {
        println!("Created segment {}/{}: {}", segment.index, total, path.display());
    })?;
    println!("Splitting complete.");
    Ok(())
}
