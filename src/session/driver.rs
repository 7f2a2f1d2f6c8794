use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::annotate::Annotator;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::integration::DetectionOracle;
use crate::session::{CancellationToken, StatusSink};
use crate::tally::{Annotation, TallyEngine, TallySnapshot};
use crate::video::{FrameSink, FrameSource, VideoInfo};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    /// Every input frame was written.
    Complete,
    /// Stopped by cancellation; the output holds the frames read so far.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub completion: Completion,
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub snapshot: TallySnapshot,
}

/// Outcome plus where it came from, as written by `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub outcome: SessionOutcome,
    pub counts: BTreeMap<&'static str, u64>,
}

impl SessionReport {
    pub fn new(input: PathBuf, output: PathBuf, outcome: SessionOutcome, engine: &TallyEngine) -> Self {
        Self {
            input,
            output,
            outcome,
            counts: engine.counts_by_name(),
        }
    }
}

/// Drives one video through oracle, tally engine and annotator.
///
/// Frames are handled strictly one at a time. Every `frame_stride`-th frame
/// (starting with frame 0) goes to the oracle and is annotated; the others
/// are written through untouched, so the output has as many frames as were
/// read. Cancellation is checked before each frame is read.
pub struct SessionDriver {
    config: SessionConfig,
    annotator: Annotator,
}

impl SessionDriver {
    pub fn new(config: SessionConfig, annotator: Annotator) -> Self {
        let annotator = annotator.with_trails(config.draw_trails);
        Self { config, annotator }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run a session.
    ///
    /// `open_sink` is called with the input's properties before any frame is
    /// read; if it fails the source is released and the error returned.
    /// `engine` and `oracle` are reset first, so no state carries over from a
    /// previous run.
    pub fn run<Src, Snk, O, S>(
        &self,
        mut source: Src,
        open_sink: impl FnOnce(&VideoInfo) -> Result<Snk>,
        oracle: &mut O,
        engine: &mut TallyEngine,
        status: &mut S,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome>
    where
        Src: FrameSource,
        Snk: FrameSink,
        O: DetectionOracle,
        O::Error: std::error::Error + Send + Sync + 'static,
        S: StatusSink,
    {
        let info = source.info().clone();
        let mut sink = match open_sink(&info) {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(error = %e, "output could not be opened, aborting");
                drop(source);
                return Err(e);
            }
        };

        engine.reset();
        oracle.reset();

        let stride = u64::from(self.config.frame_stride.max(1));
        let mut frames_read = 0u64;
        let mut frames_sampled = 0u64;
        let mut completion = Completion::Complete;
        tracing::info!(
            width = info.width,
            height = info.height,
            total_frames = info.frame_count,
            stride,
            "session started"
        );

        let result = loop {
            if cancel.is_cancelled() {
                tracing::warn!(frames_read, "session cancelled");
                completion = Completion::Partial;
                break Ok(());
            }
            let mut frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };

            if frame.index % stride == 0 {
                let detections = match oracle.detect_and_track(&frame) {
                    Ok(d) => d,
                    Err(e) => break Err(Error::Oracle(Box::new(e))),
                };
                let annotations: Vec<Annotation> = detections
                    .iter()
                    .filter_map(|d| engine.process(d, info.height))
                    .collect();
                tracing::debug!(
                    frame = frame.index,
                    detections = detections.len(),
                    accepted = annotations.len(),
                    "sampled frame"
                );
                self.annotator
                    .draw(&mut frame.image, &annotations, engine.history());
                frames_sampled += 1;

                if let Err(e) = sink.write_frame(&frame.image) {
                    break Err(e);
                }
                frames_read += 1;
                status.summary(&engine.summary().to_string());
                status.frame(&frame.image);
                status.progress(progress(frames_read, info.frame_count));
            } else {
                if let Err(e) = sink.write_frame(&frame.image) {
                    break Err(e);
                }
                frames_read += 1;
            }
        };

        // The output is closed even when the loop failed, so whatever was
        // written stays playable.
        let finished = sink.finish();
        result?;
        finished?;
        drop(source);

        if completion == Completion::Complete {
            status.progress(1.0);
        }
        let snapshot = engine.summary();
        status.summary(&snapshot.to_string());
        tracing::info!(
            ?completion,
            frames_read,
            frames_sampled,
            tally = %snapshot,
            "session finished"
        );

        Ok(SessionOutcome {
            completion,
            frames_read,
            frames_sampled,
            snapshot,
        })
    }
}

fn progress(frames_read: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (frames_read as f64 / total as f64).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress(5, 10), 0.5);
        assert_eq!(progress(12, 10), 1.0);
        assert_eq!(progress(3, 0), 0.0);
    }
}
