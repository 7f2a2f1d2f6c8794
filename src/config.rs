//! Session configuration.
//!
//! Every struct here has a `Default` matching the stock behaviour and
//! deserializes with `#[serde(default)]`, so a JSON file only needs the
//! fields it changes.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::tracker::TrackerConfig;

/// Counting policy for the tally engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Minimum detection confidence, inclusive
    pub confidence_threshold: f32,
    /// Positions kept per track
    pub history_len: usize,
    /// Lower edges above `frame_height / roi_divisor` are ignored
    pub roi_divisor: u32,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            history_len: 30,
            roi_divisor: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Every `frame_stride`-th frame is sent to the oracle
    pub frame_stride: u32,
    /// Draw each track's recent path
    pub draw_trails: bool,
    pub tally: TallyConfig,
    pub tracker: TrackerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_stride: 5,
            draw_trails: false,
            tally: TallyConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"frame_stride": 3, "tally": {"confidence_threshold": 0.5}}"#)
                .unwrap();
        assert_eq!(config.frame_stride, 3);
        assert_eq!(config.tally.confidence_threshold, 0.5);
        assert_eq!(config.tally.history_len, 30);
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"draw_trails": true}"#).unwrap();
        let config = SessionConfig::from_json_file(&path).unwrap();
        assert!(config.draw_trails);
        assert_eq!(config.frame_stride, 5);
    }
}
