use std::collections::{BTreeMap, HashSet};
use std::fmt;

use image::Rgb;
use serde::Serialize;

use crate::config::TallyConfig;
use crate::integration::TrackedDetection;
use crate::tally::classes::{self, ClassId, DisplayGroup, TRACKED_CLASSES};
use crate::tally::history::TrackHistory;
use crate::tracker::BoundingBox;

/// What to draw for one accepted detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub track_id: u64,
    pub class_id: ClassId,
    /// `"<class name> <class count>"`
    pub label: String,
    pub color: Rgb<u8>,
    pub bbox: BoundingBox,
}

/// Running totals grouped for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallySnapshot {
    pub vehicles: u64,
    pub bicycles: u64,
    pub people: u64,
}

impl fmt::Display for TallySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vehicles: {} | Bicycles: {} | People: {}",
            self.vehicles, self.bicycles, self.people
        )
    }
}

/// Session state for counting unique objects.
///
/// A track identifier is counted once, the first time one of its detections
/// passes the class, confidence and region filters. Later sightings of the
/// same identifier only extend its position history, even if the oracle
/// reports a different class for it.
#[derive(Debug, Clone)]
pub struct TallyEngine {
    config: TallyConfig,
    history: TrackHistory,
    seen: HashSet<u64>,
    counts: BTreeMap<ClassId, u64>,
}

impl Default for TallyEngine {
    fn default() -> Self {
        Self::new(TallyConfig::default())
    }
}

impl TallyEngine {
    pub fn new(config: TallyConfig) -> Self {
        Self {
            history: TrackHistory::new(config.history_len),
            seen: HashSet::new(),
            counts: TRACKED_CLASSES.iter().map(|c| (c.id, 0)).collect(),
            config,
        }
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Forget every track and zero all counters.
    pub fn reset(&mut self) {
        self.history.clear();
        self.seen.clear();
        self.counts.values_mut().for_each(|c| *c = 0);
    }

    /// Y coordinate a detection's lower edge must reach to be considered.
    pub fn roi_boundary(&self, frame_height: u32) -> f32 {
        (frame_height / self.config.roi_divisor.max(1)) as f32
    }

    /// Filter, record and possibly count one detection.
    ///
    /// Returns `None` without touching any state when the detection is of an
    /// untracked class, below the confidence threshold, or lies entirely
    /// above the region of interest. NaN confidences and boxes never pass.
    pub fn process(&mut self, detection: &TrackedDetection, frame_height: u32) -> Option<Annotation> {
        let class = classes::lookup(detection.class_id)?;
        let confidence = detection.confidence;
        if confidence.is_nan() || confidence < self.config.confidence_threshold {
            return None;
        }
        let lower_edge = detection.bbox.lower_edge();
        if lower_edge.is_nan() || lower_edge < self.roi_boundary(frame_height) {
            return None;
        }

        let bbox = detection.bbox;
        self.history.push(detection.track_id, (bbox.cx, bbox.cy));

        let count = self.counts.entry(class.id).or_insert(0);
        if self.seen.insert(detection.track_id) {
            *count += 1;
            tracing::debug!(
                track_id = detection.track_id,
                class = class.name,
                total = *count,
                "counted new object"
            );
        }

        Some(Annotation {
            track_id: detection.track_id,
            class_id: class.id,
            label: format!("{} {}", class.name, *count),
            color: class.color,
            bbox,
        })
    }

    /// Totals per display group, computed from the class counters.
    pub fn summary(&self) -> TallySnapshot {
        let mut snapshot = TallySnapshot::default();
        for class in &TRACKED_CLASSES {
            let n = self.count(class.id);
            match class.group {
                DisplayGroup::Vehicles => snapshot.vehicles += n,
                DisplayGroup::Bicycles => snapshot.bicycles += n,
                DisplayGroup::People => snapshot.people += n,
            }
        }
        snapshot
    }

    /// Unique objects counted for `class_id`.
    pub fn count(&self, class_id: ClassId) -> u64 {
        self.counts.get(&class_id).copied().unwrap_or(0)
    }

    /// Counts keyed by class name, in class id order.
    pub fn counts_by_name(&self) -> BTreeMap<&'static str, u64> {
        TRACKED_CLASSES
            .iter()
            .map(|c| (c.name, self.count(c.id)))
            .collect()
    }

    /// Number of distinct track identifiers counted so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_seen(&self, track_id: u64) -> bool {
        self.seen.contains(&track_id)
    }

    pub fn history(&self) -> &TrackHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: ClassId, track_id: u64, confidence: f32, bbox: [f32; 4]) -> TrackedDetection {
        TrackedDetection {
            class_id,
            track_id,
            confidence,
            bbox: bbox.into(),
        }
    }

    fn total(engine: &TallyEngine) -> u64 {
        TRACKED_CLASSES.iter().map(|c| engine.count(c.id)).sum()
    }

    #[test]
    fn test_counts_track_once() {
        let mut engine = TallyEngine::default();
        for i in 0..10 {
            let ann = engine.process(&det(2, 7, 0.9, [100.0 + i as f32, 400.0, 50.0, 50.0]), 600);
            assert_eq!(ann.unwrap().label, "car 1");
        }
        assert_eq!(engine.count(2), 1);
        assert_eq!(engine.seen_count(), 1);
    }

    #[test]
    fn test_class_change_does_not_recount() {
        let mut engine = TallyEngine::default();
        engine.process(&det(2, 7, 0.9, [100.0, 400.0, 50.0, 50.0]), 600);
        let ann = engine.process(&det(7, 7, 0.9, [100.0, 400.0, 50.0, 50.0]), 600).unwrap();
        assert_eq!(engine.count(2), 1);
        assert_eq!(engine.count(7), 0);
        assert_eq!(ann.label, "truck 0");
        assert_eq!(total(&engine), engine.seen_count() as u64);
    }

    #[test]
    fn test_confidence_threshold_is_inclusive() {
        let mut engine = TallyEngine::default();
        assert!(engine.process(&det(0, 1, 0.59, [10.0, 500.0, 10.0, 10.0]), 600).is_none());
        assert_eq!(engine.count(0), 0);
        assert!(engine.history().get(1).is_none());

        assert!(engine.process(&det(0, 1, 0.6, [10.0, 500.0, 10.0, 10.0]), 600).is_some());
        assert_eq!(engine.count(0), 1);
    }

    #[test]
    fn test_region_filter() {
        let mut engine = TallyEngine::default();
        // lower edge 199 < 200
        assert!(engine.process(&det(2, 1, 0.99, [100.0, 189.0, 20.0, 20.0]), 600).is_none());
        // lower edge exactly on the boundary
        assert!(engine.process(&det(2, 2, 0.99, [100.0, 190.0, 20.0, 20.0]), 600).is_some());
        assert_eq!(engine.count(2), 1);
        assert!(!engine.has_seen(1));
    }

    #[test]
    fn test_nan_confidence_rejected() {
        let mut engine = TallyEngine::default();
        assert!(engine.process(&det(2, 1, f32::NAN, [100.0, 400.0, 50.0, 50.0]), 600).is_none());
        assert_eq!(engine.seen_count(), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_nan_box_rejected() {
        let mut engine = TallyEngine::default();
        assert!(engine.process(&det(2, 1, 0.9, [100.0, f32::NAN, 50.0, 50.0]), 600).is_none());
        assert!(engine.process(&det(2, 2, 0.9, [100.0, 400.0, 50.0, f32::NAN]), 600).is_none());
        assert_eq!(engine.count(2), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_untracked_class_ignored() {
        let mut engine = TallyEngine::default();
        assert!(engine.process(&det(4, 3, 0.99, [100.0, 400.0, 50.0, 50.0]), 600).is_none());
        assert_eq!(engine.seen_count(), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_history_keeps_latest_thirty() {
        let mut engine = TallyEngine::default();
        for i in 0..45 {
            engine.process(&det(1, 5, 0.9, [i as f32, 400.0, 10.0, 10.0]), 600);
        }
        let xs: Vec<f32> = engine.history().get(5).unwrap().iter().map(|p| p.0).collect();
        assert_eq!(xs, (15..45).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_summary_groups() {
        let mut engine = TallyEngine::default();
        let classes = [0, 1, 1, 2, 3, 5, 7];
        for (track_id, class_id) in classes.iter().enumerate() {
            engine.process(&det(*class_id, track_id as u64, 0.9, [0.0, 500.0, 10.0, 10.0]), 600);
        }
        let snapshot = engine.summary();
        assert_eq!(
            snapshot,
            TallySnapshot {
                vehicles: 4,
                bicycles: 2,
                people: 1
            }
        );
        assert_eq!(snapshot.to_string(), "Vehicles: 4 | Bicycles: 2 | People: 1");
        assert_eq!(total(&engine), engine.seen_count() as u64);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut engine = TallyEngine::default();
        engine.process(&det(2, 1, 0.9, [0.0, 500.0, 10.0, 10.0]), 600);
        engine.reset();
        assert_eq!(engine.summary(), TallySnapshot::default());
        assert!(engine.history().is_empty());
        assert!(engine.process(&det(2, 1, 0.9, [0.0, 500.0, 10.0, 10.0]), 600).is_some());
        assert_eq!(engine.count(2), 1);
    }
}
