use std::fs::File;
use std::path::{Path, PathBuf};

use image::RgbImage;
use opencv::core::{self, Mat, Scalar};
use opencv::prelude::*;
use opencv::{imgproc, videoio};

use super::{Frame, FrameSink, FrameSource, VideoInfo};
use crate::error::{Error, Result};

/// Used when the container does not report a usable frame rate.
const FALLBACK_FPS: f64 = 30.0;

/// FourCC of the session output when none is given.
pub const DEFAULT_FOURCC: &str = "mp4v";

fn mat_to_rgb(bgr: &Mat) -> Result<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let data = rgb.data_bytes()?.to_vec();
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| Error::Decode(format!("{width}x{height} frame has a short buffer")))
}

fn rgb_to_mat(image: &RgbImage) -> Result<Mat> {
    let (width, height) = image.dimensions();
    let mut rgb = Mat::new_rows_cols_with_default(
        height as i32,
        width as i32,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    rgb.data_bytes_mut()?.copy_from_slice(image.as_raw());
    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
    Ok(bgr)
}

fn read_rgb(capture: &mut videoio::VideoCapture) -> Result<Option<RgbImage>> {
    let mut bgr = Mat::default();
    if !capture.read(&mut bgr)? || bgr.empty() {
        return Ok(None);
    }
    mat_to_rgb(&bgr).map(Some)
}

/// Decodes a video file to RGB frames.
pub struct VideoReader {
    capture: videoio::VideoCapture,
    info: VideoInfo,
    /// First frame, decoded at open time to learn the display size
    pending: Option<RgbImage>,
    next_index: u64,
}

impl VideoReader {
    pub fn open(path: &Path) -> Result<Self> {
        let fail = |reason: &str| Error::InputOpen {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        let name = path.to_str().ok_or_else(|| fail("path is not valid UTF-8"))?;
        if !path.is_file() {
            return Err(fail("no such file"));
        }

        let mut capture = videoio::VideoCapture::from_file(name, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(fail("unsupported or unreadable video"));
        }
        let _ = capture.set(videoio::CAP_PROP_ORIENTATION_AUTO, 1.0);

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { FALLBACK_FPS };
        let count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let frame_count = if count.is_finite() && count > 0.0 { count as u64 } else { 0 };

        // Coded width/height are pre-rotation for portrait phone footage; the
        // decoded frame is what gets annotated and written.
        let first = read_rgb(&mut capture)?.ok_or_else(|| fail("no decodable frames"))?;
        let (width, height) = first.dimensions();
        let info = VideoInfo {
            width,
            height,
            fps,
            frame_count,
            duration: (frame_count > 0).then(|| frame_count as f64 / fps),
        };

        tracing::info!(
            path = %path.display(),
            width,
            height,
            fps,
            frames = frame_count,
            "opened input"
        );
        Ok(Self {
            capture,
            info,
            pending: Some(first),
            next_index: 0,
        })
    }
}

impl FrameSource for VideoReader {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let image = match self.pending.take() {
            Some(image) => image,
            None => match read_rgb(&mut self.capture)? {
                Some(image) => image,
                None => return Ok(None),
            },
        };
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Encodes RGB frames to a video file.
pub struct VideoWriter {
    path: PathBuf,
    width: u32,
    height: u32,
    writer: Option<videoio::VideoWriter>,
    frames_written: u64,
}

impl VideoWriter {
    /// Open `path` for writing at the size and rate of `info`, encoding with
    /// the four-character codec code `fourcc` (e.g. `mp4v`, `avc1`, `MJPG`).
    ///
    /// The file is created up front so an unwritable destination is reported
    /// here rather than after frames have been decoded.
    pub fn create(path: &Path, info: &VideoInfo, fourcc: &str) -> Result<Self> {
        let fail = |reason: String| Error::OutputOpen {
            path: path.to_path_buf(),
            reason,
        };
        let code: Vec<char> = fourcc.chars().collect();
        let &[a, b, c, d] = code.as_slice() else {
            return Err(fail(format!("`{fourcc}` is not a four-character codec code")));
        };
        let name = path
            .to_str()
            .ok_or_else(|| fail("path is not valid UTF-8".to_string()))?;
        File::create(path).map_err(|e| fail(e.to_string()))?;

        let writer = videoio::VideoWriter::new(
            name,
            videoio::VideoWriter::fourcc(a, b, c, d)?,
            info.fps,
            core::Size::new(info.width as i32, info.height as i32),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(fail(format!("no encoder available for `{fourcc}`")));
        }
        tracing::info!(path = %path.display(), codec = fourcc, "opened output");

        Ok(Self {
            path: path.to_path_buf(),
            width: info.width,
            height: info.height,
            writer: Some(writer),
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for VideoWriter {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        if image.dimensions() != (self.width, self.height) {
            return Err(Error::FrameSize {
                expected: (self.width, self.height),
                got: image.dimensions(),
            });
        }
        let writer = self.writer.as_mut().ok_or(Error::OutputClosed)?;
        writer.write(&rgb_to_mat(image)?)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.release()?;
        tracing::info!(path = %self.path.display(), frames = self.frames_written, "output finalized");
        Ok(())
    }
}
