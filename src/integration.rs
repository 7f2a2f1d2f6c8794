//! Sources of tracked detections.
//!
//! A session only needs a [`DetectionOracle`]. [`TrackingOracle`] builds one
//! from any per-frame [`DetectionSource`] plus the in-crate ByteTrack tracker;
//! [`ReplayOracle`] replays identities recorded elsewhere.

mod builder;
mod detector;
mod pipeline;
mod replay;

pub use builder::DetectionBuilder;
pub use detector::{DetectionOracle, DetectionSource, TrackedDetection};
pub use pipeline::TrackingOracle;
pub use replay::{DetectionLog, LogDetector, LoggedDetection, ReplayOracle};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
