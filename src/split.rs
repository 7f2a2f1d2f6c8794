//! Cutting a video into equal-length segments with the `ffmpeg` and
//! `ffprobe` command line tools.
//!
//! Reading the duration is the only hard failure. Each cut is attempted once;
//! a failed cut is logged and skipped, and the batch carries on.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Locations of the external multimedia tools.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

fn os_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    args.into_iter().map(Into::into).collect()
}

/// Plain-number duration output, e.g. `"12.480000\n"`.
pub fn parse_duration(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Container duration of `path` in seconds, as reported by `ffprobe`.
pub fn probe_duration(ffprobe: &Path, path: &Path) -> Result<f64> {
    let mut args = os_args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]);
    args.push(path.as_os_str().to_owned());

    let output = Command::new(ffprobe)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            program: ffprobe.display().to_string(),
            source,
        })?;
    parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| Error::Duration {
        path: path.to_path_buf(),
        reason: "unable to determine video duration".to_string(),
    })
}

/// One window of the source video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// 1-based position in the batch
    pub index: u32,
    /// Offset from the start, in seconds
    pub start: f64,
    pub duration: f64,
}

/// Result of a split run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitReport {
    pub created: Vec<PathBuf>,
    /// Indices of segments whose cut failed
    pub failed: Vec<u32>,
}

/// `parts` back-to-back windows covering `total` seconds.
pub fn plan_segments(total: f64, parts: u32) -> Result<Vec<Segment>> {
    if parts == 0 {
        return Err(Error::InvalidSegmentCount);
    }
    let duration = total / f64::from(parts);
    Ok((0..parts)
        .map(|i| Segment {
            index: i + 1,
            start: f64::from(i) * duration,
            duration,
        })
        .collect())
}

pub fn segment_file_name(index: u32) -> String {
    format!("segment_{index:02}.mp4")
}

fn cut(tools: &FfmpegTools, input: &Path, segment: &Segment, output: &Path) -> std::io::Result<bool> {
    let mut args = os_args(["-y", "-i"]);
    args.push(input.as_os_str().to_owned());
    args.extend(os_args([
        "-ss".to_string(),
        segment.start.to_string(),
        "-t".to_string(),
        segment.duration.to_string(),
        "-c".to_string(),
        "copy".to_string(),
    ]));
    args.push(output.as_os_str().to_owned());

    let status = Command::new(&tools.ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(status.success())
}

/// Split `input` into `parts` stream-copied segments under `output_dir`.
///
/// `on_segment` is called after each attempted cut with the segment and its
/// output path.
pub fn split_video(
    tools: &FfmpegTools,
    input: &Path,
    output_dir: &Path,
    parts: u32,
    mut on_segment: impl FnMut(&Segment, &Path),
) -> Result<SplitReport> {
    if parts == 0 {
        return Err(Error::InvalidSegmentCount);
    }
    let total = probe_duration(&tools.ffprobe, input)?;
    std::fs::create_dir_all(output_dir)?;
    tracing::info!(input = %input.display(), total, parts, "splitting");

    let mut report = SplitReport::default();
    for segment in plan_segments(total, parts)? {
        let output = output_dir.join(segment_file_name(segment.index));
        match cut(tools, input, &segment, &output) {
            Ok(true) => report.created.push(output.clone()),
            Ok(false) => {
                tracing::warn!(segment = segment.index, "ffmpeg failed to cut segment, skipping");
                report.failed.push(segment.index);
            }
            Err(e) => {
                tracing::warn!(segment = segment.index, error = %e, "could not run ffmpeg, skipping");
                report.failed.push(segment.index);
            }
        }
        on_segment(&segment, &output);
    }
    Ok(report)
}
