//! Unique-object tallying over tracked detections.
//!
//! The engine keeps three pieces of per-session state: a bounded position
//! history per track, the set of track identifiers already counted, and one
//! counter per tracked class. The sum of the counters always equals the size
//! of the counted set.

mod classes;
mod engine;
mod history;

pub use classes::{ClassId, DisplayGroup, TRACKED_CLASSES, TrackedClass, lookup};
pub use engine::{Annotation, TallyEngine, TallySnapshot};
pub use history::TrackHistory;
