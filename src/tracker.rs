//! Multi-object tracking that gives detections stable identities across frames.

mod byte_tracker;
mod kalman_filter;
mod matching;
mod rect;
mod strack;

pub use byte_tracker::{ByteTracker, TrackerConfig};
pub use kalman_filter::KalmanFilter;
pub use matching::Detection;
pub use rect::{BoundingBox, Rect};
pub use strack::{STrack, TrackState};
