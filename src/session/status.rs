use std::path::PathBuf;

use image::RgbImage;

/// Receiver of live session updates. Only the latest value of each kind
/// matters; nothing is acknowledged.
pub trait StatusSink {
    /// Fraction of input frames consumed, in `[0, 1]`.
    fn progress(&mut self, fraction: f32);

    fn summary(&mut self, text: &str);

    /// The most recent annotated frame.
    fn frame(&mut self, _frame: &RgbImage) {}
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn progress(&mut self, fraction: f32) {
        (**self).progress(fraction)
    }

    fn summary(&mut self, text: &str) {
        (**self).summary(text)
    }

    fn frame(&mut self, frame: &RgbImage) {
        (**self).frame(frame)
    }
}

/// Discards every update.
#[derive(Debug, Default)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn progress(&mut self, _fraction: f32) {}

    fn summary(&mut self, _text: &str) {}
}

/// Logs progress at every 10% step and keeps the last summary. Optionally
/// saves the latest annotated frame as an image, overwriting it each time.
#[derive(Debug, Default)]
pub struct LogStatus {
    last_decile: Option<u32>,
    last_summary: String,
    preview: Option<PathBuf>,
}

impl LogStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview(mut self, path: PathBuf) -> Self {
        self.preview = Some(path);
        self
    }

    pub fn last_summary(&self) -> &str {
        &self.last_summary
    }
}

impl StatusSink for LogStatus {
    fn progress(&mut self, fraction: f32) {
        let decile = (fraction.clamp(0.0, 1.0) * 10.0) as u32;
        if self.last_decile != Some(decile) {
            self.last_decile = Some(decile);
            tracing::info!(
                percent = decile * 10,
                tally = %self.last_summary,
                "processing"
            );
        }
    }

    fn summary(&mut self, text: &str) {
        if text != self.last_summary {
            tracing::debug!(tally = text, "tally changed");
            self.last_summary = text.to_string();
        }
    }

    fn frame(&mut self, frame: &RgbImage) {
        if let Some(path) = &self.preview {
            if let Err(e) = frame.save(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to save preview");
            }
        }
    }
}
