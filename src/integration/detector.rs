//! Traits at the boundary with detection and tracking backends.

use serde::{Deserialize, Serialize};

use crate::tracker::{BoundingBox, Detection};
use crate::video::Frame;

/// One object in one frame, with an identity that persists across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetection {
    pub class_id: u32,
    pub track_id: u64,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
    /// Center-based box in frame pixels
    pub bbox: BoundingBox,
}

/// Per-frame object detector without memory of earlier frames.
///
/// Implement this to plug a model into [`TrackingOracle`](super::TrackingOracle),
/// which adds track identities.
///
/// # Example
///
/// ```ignore
/// use traffic_tally::{Detection, DetectionSource, Frame};
///
/// struct MyDetector;
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    type Error;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}

/// Detector plus tracker: the frame-to-identities service a session drives.
///
/// Implementations are stateful; identities returned for one frame must carry
/// over to later frames of the same session.
pub trait DetectionOracle {
    type Error;

    fn detect_and_track(&mut self, frame: &Frame) -> Result<Vec<TrackedDetection>, Self::Error>;

    /// Forget all tracking state before a new session.
    fn reset(&mut self) {}
}

impl<O: DetectionOracle + ?Sized> DetectionOracle for &mut O {
    type Error = O::Error;

    fn detect_and_track(&mut self, frame: &Frame) -> Result<Vec<TrackedDetection>, Self::Error> {
        (**self).detect_and_track(frame)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
