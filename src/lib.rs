//! Traffic activity counting for recorded video.
//!
//! A [`SessionDriver`] reads frames, sends every fifth one to a
//! [`DetectionOracle`] (a detector plus the in-crate ByteTrack tracker), and
//! feeds the tracked detections to a [`TallyEngine`], which counts each track
//! identifier once and produces box-and-label overlays. Video is decoded and
//! re-encoded with OpenCV.
//!
//! The [`split`] module cuts a video into equal-length parts with `ffmpeg`.

pub mod annotate;
pub mod config;
pub mod error;
pub mod integration;
pub mod session;
pub mod split;
pub mod tally;
pub mod tracker;
pub mod video;

pub use annotate::Annotator;
pub use config::{SessionConfig, TallyConfig};
pub use error::{Error, Result};
pub use integration::{
    DetectionBuilder, DetectionLog, DetectionOracle, DetectionSource, LogDetector, ReplayOracle,
    TrackedDetection, TrackingOracle,
};
#[cfg(feature = "burn-backend")]
pub use integration::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
pub use session::{
    CancellationToken, Completion, LogStatus, NullStatus, SessionDriver, SessionOutcome,
    SessionReport, StatusSink,
};
pub use tally::{Annotation, TallyEngine, TallySnapshot};
pub use tracker::{BoundingBox, ByteTracker, Detection, TrackerConfig};
pub use video::{Frame, FrameSink, FrameSource, VideoInfo, VideoReader, VideoWriter};
