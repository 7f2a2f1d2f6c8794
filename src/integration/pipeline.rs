//! Detector and ByteTrack combined into a [`DetectionOracle`].

use crate::tracker::{BoundingBox, ByteTracker, TrackerConfig};
use crate::video::Frame;

use super::{DetectionOracle, DetectionSource, TrackedDetection};

/// Runs any [`DetectionSource`] through a [`ByteTracker`] that persists
/// across calls, so detections come out with stable track identifiers.
pub struct TrackingOracle<D: DetectionSource> {
    detector: D,
    tracker: ByteTracker,
}

impl<D: DetectionSource> TrackingOracle<D> {
    pub fn new(detector: D, config: TrackerConfig) -> Self {
        Self {
            detector,
            tracker: ByteTracker::new(config),
        }
    }

    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerConfig::default())
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &ByteTracker {
        &self.tracker
    }
}

impl<D: DetectionSource> DetectionOracle for TrackingOracle<D> {
    type Error = D::Error;

    fn detect_and_track(&mut self, frame: &Frame) -> Result<Vec<TrackedDetection>, Self::Error> {
        let detections = self.detector.detect(frame)?;
        let tracks = self.tracker.update(detections);
        tracing::trace!(frame = frame.index, tracks = tracks.len(), "tracker updated");

        Ok(tracks
            .into_iter()
            .map(|t| TrackedDetection {
                class_id: t.class_id,
                track_id: t.track_id,
                confidence: t.score,
                bbox: BoundingBox::from(t.rect()),
            })
            .collect())
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}
