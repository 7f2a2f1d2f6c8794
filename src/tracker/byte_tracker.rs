//! ByteTrack: two-stage association of high- and low-confidence detections.

use std::collections::HashSet;

use serde::Deserialize;

use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::strack::{STrack, TrackState};

/// Detections below this score are discarded outright.
const LOW_SCORE_FLOOR: f32 = 0.1;
const SECOND_MATCH_THRESH: f32 = 0.5;
const UNCONFIRMED_MATCH_THRESH: f32 = 0.7;
const DUPLICATE_IOU: f32 = 0.85;

/// Configuration for the ByteTracker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Score splitting high from low confidence detections
    pub track_thresh: f32,
    /// Maximum fused cost for a first-stage match
    pub match_thresh: f32,
    /// Frames a lost track survives, at 30 fps
    pub track_buffer: u32,
    pub frame_rate: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            match_thresh: 0.8,
            track_buffer: 30,
            frame_rate: 30.0,
        }
    }
}

pub struct ByteTracker {
    tracked_stracks: Vec<STrack>,
    lost_stracks: Vec<STrack>,
    frame_id: u32,
    next_id: u64,
    config: TrackerConfig,
    max_time_lost: u32,
    kalman_filter: KalmanFilter,
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let max_time_lost = (config.frame_rate / 30.0 * config.track_buffer as f32) as u32;
        Self {
            tracked_stracks: Vec::new(),
            lost_stracks: Vec::new(),
            frame_id: 0,
            next_id: 0,
            config,
            max_time_lost,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of `update` calls since creation or the last reset.
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    /// Drop every track and restart identifiers at 1.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Advance one frame and return the tracks confirmed in it.
    pub fn update(&mut self, detections: Vec<Detection>) -> Vec<STrack> {
        self.frame_id += 1;

        let mut activated_stracks = Vec::new();
        let mut refind_stracks = Vec::new();
        let mut lost_stracks = Vec::new();

        let (high, low): (Vec<_>, Vec<_>) = detections
            .into_iter()
            .filter(|d| d.score > LOW_SCORE_FLOOR)
            .partition(|d| d.score >= self.config.track_thresh);
        let detections: Vec<STrack> = high.iter().map(STrack::new).collect();

        let (tracked, unconfirmed): (Vec<_>, Vec<_>) = self
            .tracked_stracks
            .drain(..)
            .partition(|t| t.is_activated);
        let mut unconfirmed = unconfirmed;

        let mut strack_pool = joint_stracks(tracked, &self.lost_stracks);
        STrack::multi_predict(&mut strack_pool, &self.kalman_filter);

        // First association: high score detections against every known track.
        let mut dists = matching::iou_distance(&rects(&strack_pool), &rects(&detections));
        matching::fuse_score(&mut dists, &scores(&detections));
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&dists, self.config.match_thresh);

        for (itracked, idet) in matches {
            let mut track = strack_pool[itracked].clone();
            if track.state == TrackState::Tracked {
                track.update(&detections[idet], &self.kalman_filter, self.frame_id);
                activated_stracks.push(track);
            } else {
                track.re_activate(&detections[idet], &self.kalman_filter, self.frame_id);
                refind_stracks.push(track);
            }
        }

        // Second association: leftover tracked tracks against low score detections.
        let detections_second: Vec<STrack> = low.iter().map(STrack::new).collect();
        let r_tracked_stracks: Vec<STrack> = unmatched_tracks
            .iter()
            .map(|&i| &strack_pool[i])
            .filter(|t| t.state == TrackState::Tracked)
            .cloned()
            .collect();

        let dists_second =
            matching::iou_distance(&rects(&r_tracked_stracks), &rects(&detections_second));
        let AssignmentResult {
            matches: matches_second,
            unmatched_tracks: unmatched_second,
            ..
        } = matching::linear_assignment(&dists_second, SECOND_MATCH_THRESH);

        for (itracked, idet) in matches_second {
            let mut track = r_tracked_stracks[itracked].clone();
            track.update(&detections_second[idet], &self.kalman_filter, self.frame_id);
            activated_stracks.push(track);
        }

        for idx in unmatched_second {
            let mut track = r_tracked_stracks[idx].clone();
            track.mark_lost();
            lost_stracks.push(track);
        }

        // Unconfirmed tracks (one frame old) get one chance at the remaining
        // detections; those that miss it are dropped.
        let detections_rem: Vec<STrack> = unmatched_detections
            .iter()
            .map(|&i| detections[i].clone())
            .collect();

        let mut dists_unconfirmed =
            matching::iou_distance(&rects(&unconfirmed), &rects(&detections_rem));
        matching::fuse_score(&mut dists_unconfirmed, &scores(&detections_rem));
        let AssignmentResult {
            matches: matches_unconfirmed,
            unmatched_detections: unmatched_new,
            ..
        } = matching::linear_assignment(&dists_unconfirmed, UNCONFIRMED_MATCH_THRESH);

        for (itracked, idet) in matches_unconfirmed {
            unconfirmed[itracked].update(&detections_rem[idet], &self.kalman_filter, self.frame_id);
            activated_stracks.push(unconfirmed[itracked].clone());
        }

        // New tracks need a margin above the split threshold.
        for idx in unmatched_new {
            let mut track = detections_rem[idx].clone();
            if track.score < self.config.track_thresh + 0.1 {
                continue;
            }
            let id = self.allocate_id();
            track.activate(&self.kalman_filter, self.frame_id, id);
            activated_stracks.push(track);
        }

        // Lost tracks past the buffer are forgotten; their ids are never reused.
        let (frame_id, max_time_lost) = (self.frame_id, self.max_time_lost);
        lost_stracks.extend(
            self.lost_stracks
                .drain(..)
                .filter(|t| frame_id - t.end_frame() <= max_time_lost),
        );

        let tracked: Vec<STrack> = activated_stracks
            .into_iter()
            .chain(refind_stracks)
            .filter(|t| t.state == TrackState::Tracked)
            .collect();
        let lost = sub_stracks(lost_stracks, &tracked);

        let (tracked, lost) = remove_duplicate_stracks(tracked, lost);
        self.tracked_stracks = tracked;
        self.lost_stracks = lost;

        self.tracked_stracks
            .iter()
            .filter(|t| t.is_activated)
            .cloned()
            .collect()
    }
}

fn rects(tracks: &[STrack]) -> Vec<Rect> {
    tracks.iter().map(STrack::rect).collect()
}

fn scores(tracks: &[STrack]) -> Vec<f32> {
    tracks.iter().map(|t| t.score).collect()
}

fn joint_stracks(tlista: Vec<STrack>, tlistb: &[STrack]) -> Vec<STrack> {
    let mut exists: HashSet<u64> = tlista.iter().map(|t| t.track_id).collect();
    let mut res = tlista;
    for t in tlistb {
        if exists.insert(t.track_id) {
            res.push(t.clone());
        }
    }
    res
}

fn sub_stracks(tlista: Vec<STrack>, tlistb: &[STrack]) -> Vec<STrack> {
    let b_ids: HashSet<u64> = tlistb.iter().map(|t| t.track_id).collect();
    tlista
        .into_iter()
        .filter(|t| !b_ids.contains(&t.track_id))
        .collect()
}

/// Where a tracked and a lost track overlap heavily, keep the older one.
fn remove_duplicate_stracks(
    stracksa: Vec<STrack>,
    stracksb: Vec<STrack>,
) -> (Vec<STrack>, Vec<STrack>) {
    if stracksa.is_empty() || stracksb.is_empty() {
        return (stracksa, stracksb);
    }

    let ious = iou_batch(&rects(&stracksa), &rects(&stracksb));
    let mut dupa = vec![false; stracksa.len()];
    let mut dupb = vec![false; stracksb.len()];

    for ((i, j), &iou) in ious.indexed_iter() {
        if iou > DUPLICATE_IOU {
            let age_a = stracksa[i].frame_id - stracksa[i].start_frame;
            let age_b = stracksb[j].frame_id - stracksb[j].start_frame;
            if age_a > age_b {
                dupb[j] = true;
            } else {
                dupa[i] = true;
            }
        }
    }

    let keep = |tracks: Vec<STrack>, dup: &[bool]| -> Vec<STrack> {
        tracks
            .into_iter()
            .zip(dup)
            .filter_map(|(t, &d)| (!d).then_some(t))
            .collect()
    };
    (keep(stracksa, &dupa), keep(stracksb, &dupb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_per_tracker() {
        let det = || vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9, 2)];

        let mut a = ByteTracker::new(TrackerConfig::default());
        let mut b = ByteTracker::new(TrackerConfig::default());
        assert_eq!(a.update(det())[0].track_id, 1);
        assert_eq!(b.update(det())[0].track_id, 1);
    }

    #[test]
    fn test_reset_restarts_ids() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9, 0)]);
        tracker.update(vec![Detection::new(300.0, 300.0, 350.0, 350.0, 0.9, 0)]);
        tracker.reset();
        assert_eq!(tracker.frame_id(), 0);
        let tracks = tracker.update(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9, 0)]);
        assert_eq!(tracks[0].track_id, 1);
    }

    #[test]
    fn test_lost_track_expires_after_buffer() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        let det = || vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9, 2)];
        let first = tracker.update(det())[0].track_id;

        // absent for longer than the 30-frame buffer
        for _ in 0..32 {
            tracker.update(vec![]);
        }
        assert!(tracker.lost_stracks.is_empty());

        tracker.update(det());
        let tracks = tracker.update(det());
        assert_eq!(tracks.len(), 1);
        assert_ne!(tracks[0].track_id, first);
    }

    #[test]
    fn test_weak_detection_does_not_start_track() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        let tracks = tracker.update(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.55, 2)]);
        assert!(tracks.is_empty());
    }
}
