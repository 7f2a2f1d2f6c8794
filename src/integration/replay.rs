//! Detections recorded ahead of time, one JSON object per frame.
//!
//! ```text
//! {"frame": 0, "detections": [{"class_id": 2, "confidence": 0.91, "bbox": [100, 400, 50, 50], "track_id": 7}]}
//! {"frame": 5, "detections": []}
//! ```
//!
//! `track_id` is optional. Logs without it go through [`LogDetector`] and the
//! in-crate tracker; logs exported from an external tracker can be replayed
//! as-is with [`ReplayOracle`].

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::tracker::{BoundingBox, Detection};
use crate::video::Frame;

use super::{DetectionOracle, DetectionSource, TrackedDetection};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LoggedDetection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub track_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LogLine {
    frame: u64,
    #[serde(default)]
    detections: Vec<LoggedDetection>,
}

/// Detections indexed by frame number.
#[derive(Debug, Clone, Default)]
pub struct DetectionLog {
    frames: BTreeMap<u64, Vec<LoggedDetection>>,
}

impl DetectionLog {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut log = Self::default();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: LogLine = serde_json::from_str(&line)
                .map_err(|source| Error::DetectionLog { line: i + 1, source })?;
            log.frames
                .entry(parsed.frame)
                .or_default()
                .extend(parsed.detections);
        }
        Ok(log)
    }

    /// Detections for `frame`; empty when the log has no entry for it.
    pub fn get(&self, frame: u64) -> &[LoggedDetection] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of frames with an entry.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Replays raw detections for the in-crate tracker; logged track ids are ignored.
#[derive(Debug, Clone)]
pub struct LogDetector {
    log: DetectionLog,
}

impl LogDetector {
    pub fn new(log: DetectionLog) -> Self {
        Self { log }
    }
}

impl DetectionSource for LogDetector {
    type Error = Infallible;

    fn detect(&mut self, frame: &Frame) -> std::result::Result<Vec<Detection>, Self::Error> {
        Ok(self
            .log
            .get(frame.index)
            .iter()
            .map(|d| Detection::from_rect(d.bbox.to_rect(), d.confidence, d.class_id))
            .collect())
    }
}

/// Replays already-tracked detections verbatim.
#[derive(Debug, Clone)]
pub struct ReplayOracle {
    log: DetectionLog,
    untracked: usize,
}

impl ReplayOracle {
    pub fn new(log: DetectionLog) -> Self {
        Self { log, untracked: 0 }
    }

    /// Logged detections dropped so far for lacking a `track_id`.
    pub fn untracked(&self) -> usize {
        self.untracked
    }
}

impl DetectionOracle for ReplayOracle {
    type Error = Infallible;

    fn detect_and_track(
        &mut self,
        frame: &Frame,
    ) -> std::result::Result<Vec<TrackedDetection>, Self::Error> {
        let logged = self.log.get(frame.index);
        let tracked: Vec<TrackedDetection> = logged
            .iter()
            .filter_map(|d| {
                Some(TrackedDetection {
                    class_id: d.class_id,
                    track_id: d.track_id?,
                    confidence: d.confidence,
                    bbox: d.bbox,
                })
            })
            .collect();

        let dropped = logged.len() - tracked.len();
        if dropped > 0 {
            tracing::warn!(frame = frame.index, dropped, "logged detections without track_id");
            self.untracked += dropped;
        }
        Ok(tracked)
    }

    fn reset(&mut self) {
        self.untracked = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    const LOG: &str = r#"{"frame": 0, "detections": [{"class_id": 2, "confidence": 0.9, "bbox": [100, 400, 50, 50], "track_id": 7}, {"class_id": 0, "confidence": 0.8, "bbox": [10, 500, 5, 20]}]}

{"frame": 5, "detections": [{"class_id": 2, "confidence": 0.9, "bbox": [110, 410, 50, 50], "track_id": 7}]}
"#;

    #[test]
    fn test_parse_log() {
        let log = DetectionLog::from_reader(LOG.as_bytes()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).len(), 2);
        assert_eq!(log.get(0)[0].bbox, BoundingBox::new(100.0, 400.0, 50.0, 50.0));
        assert!(log.get(3).is_empty());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let err = DetectionLog::from_reader("{\"frame\": 0}\nnot json\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::DetectionLog { line: 2, .. }));
    }

    #[test]
    fn test_replay_oracle_skips_untracked() {
        let mut oracle = ReplayOracle::new(DetectionLog::from_reader(LOG.as_bytes()).unwrap());
        let out = oracle
            .detect_and_track(&Frame::new(0, RgbImage::new(1, 1)))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 7);
        assert_eq!(oracle.untracked(), 1);
    }

    #[test]
    fn test_log_detector_converts_to_tlwh() {
        let mut detector = LogDetector::new(DetectionLog::from_reader(LOG.as_bytes()).unwrap());
        let out = detector.detect(&Frame::new(5, RgbImage::new(1, 1))).unwrap();
        assert_eq!(out[0].bbox.to_tlbr(), [85.0, 385.0, 135.0, 435.0]);
    }
}
