//! Frame-level video input and output.
//!
//! Decoding and encoding go through OpenCV's `videoio`; frames are handed to
//! the rest of the crate as `RgbImage`.

mod capture;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::RgbImage;

use crate::error::Result;

pub use capture::{DEFAULT_FOURCC, VideoReader, VideoWriter};

/// One decoded frame and its zero-based position in the stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }
}

/// Stream properties of an opened input.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Width of the decoded (display-oriented) frames
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 0 when unknown
    pub frame_count: u64,
    /// Seconds, when both rate and length are known
    pub duration: Option<f64>,
}

/// Sequential frame input.
pub trait FrameSource {
    fn info(&self) -> &VideoInfo;

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Sequential frame output.
pub trait FrameSink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()>;

    /// Flush and close the output. Further writes are errors.
    fn finish(&mut self) -> Result<()>;
}

/// `<stem>_processed_<YYYYmmdd_HHMMSS>.mp4`, relative to the working directory.
pub fn default_output_path(input: &Path, now: &NaiveDateTime) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    PathBuf::from(format!("{stem}_processed_{}.mp4", now.format("%Y%m%d_%H%M%S")))
}
