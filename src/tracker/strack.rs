//! Per-object track state for the ByteTrack tracker.

use crate::tracker::kalman_filter::{KalmanFilter, Measurement, StateCovariance, StateMean};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;

/// Lifecycle of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Created from a detection, not yet confirmed
    #[default]
    New,
    Tracked,
    /// Missed in the latest frame, kept for re-identification
    Lost,
}

/// Single object track.
#[derive(Debug, Clone)]
pub struct STrack {
    /// Track identifier, 0 until activated
    pub track_id: u64,
    /// Class of the most recently associated detection
    pub class_id: u32,
    pub state: TrackState,
    /// Whether the track has been confirmed
    pub is_activated: bool,
    /// Confidence of the most recently associated detection
    pub score: f32,
    /// Tracker frame of the last association
    pub frame_id: u32,
    pub start_frame: u32,
    pub tracklet_len: u32,
    kalman: Option<(StateMean, StateCovariance)>,
    /// Box of the detection this track was created from
    pub tlwh: Rect,
}

fn measurement_of(rect: &Rect) -> Measurement {
    let [cx, cy, a, h] = rect.to_xyah();
    Measurement::new(cx as f64, cy as f64, a as f64, h as f64)
}

impl STrack {
    pub fn new(detection: &Detection) -> Self {
        Self {
            track_id: 0,
            class_id: detection.class_id,
            state: TrackState::New,
            is_activated: false,
            score: detection.score,
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            kalman: None,
            tlwh: detection.bbox,
        }
    }

    /// Current box estimate; the filtered state once the track is running.
    pub fn rect(&self) -> Rect {
        match &self.kalman {
            Some((mean, _)) => Rect::from_xyah(
                mean[0] as f32,
                mean[1] as f32,
                mean[2] as f32,
                mean[3] as f32,
            ),
            None => self.tlwh,
        }
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    /// Start the track under `track_id`.
    pub fn activate(&mut self, kalman_filter: &KalmanFilter, frame_id: u32, track_id: u64) {
        self.track_id = track_id;
        self.kalman = Some(kalman_filter.initiate(measurement_of(&self.tlwh)));
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        // Only tracks born on the very first frame are confirmed immediately.
        self.is_activated = frame_id == 1;
        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    /// Revive a lost track with a new observation, keeping its identity.
    pub fn re_activate(&mut self, detection: &STrack, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.correct(detection, kalman_filter);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
    }

    pub fn update(&mut self, detection: &STrack, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.correct(detection, kalman_filter);
        self.frame_id = frame_id;
        self.tracklet_len += 1;
        self.state = TrackState::Tracked;
        self.is_activated = true;
    }

    fn correct(&mut self, detection: &STrack, kalman_filter: &KalmanFilter) {
        if let Some((mean, cov)) = &self.kalman {
            if let Some(corrected) = kalman_filter.update(mean, cov, measurement_of(&detection.tlwh)) {
                self.kalman = Some(corrected);
            }
        }
        self.score = detection.score;
        self.class_id = detection.class_id;
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let Some((mean, cov)) = &self.kalman {
            let mut mean = *mean;
            if self.state != TrackState::Tracked {
                // freeze height velocity
                mean[7] = 0.0;
            }
            self.kalman = Some(kalman_filter.predict(&mean, cov));
        }
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn multi_predict(stracks: &mut [STrack], kalman_filter: &KalmanFilter) {
        for strack in stracks.iter_mut() {
            strack.predict(kalman_filter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_on_first_frame_only() {
        let kf = KalmanFilter::new();
        let det = Detection::new(0.0, 0.0, 10.0, 20.0, 0.9, 2);

        let mut first = STrack::new(&det);
        first.activate(&kf, 1, 1);
        assert!(first.is_activated);
        assert_eq!(first.state, TrackState::Tracked);

        let mut later = STrack::new(&det);
        later.activate(&kf, 4, 2);
        assert!(!later.is_activated);
        assert_eq!(later.track_id, 2);
    }

    #[test]
    fn test_update_takes_latest_class() {
        let kf = KalmanFilter::new();
        let mut track = STrack::new(&Detection::new(0.0, 0.0, 10.0, 20.0, 0.9, 2));
        track.activate(&kf, 1, 1);

        let seen = STrack::new(&Detection::new(1.0, 1.0, 11.0, 21.0, 0.7, 7));
        track.update(&seen, &kf, 2);
        assert_eq!(track.class_id, 7);
        assert_eq!(track.score, 0.7);
        assert_eq!(track.tracklet_len, 1);
    }
}
