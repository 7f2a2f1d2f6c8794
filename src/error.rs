use std::path::PathBuf;

/// Errors produced while analysing or splitting a video.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read the duration of {}: {reason}", path.display())]
    Duration { path: PathBuf, reason: String },

    #[error("cannot open input {}: {reason}", path.display())]
    InputOpen { path: PathBuf, reason: String },

    #[error("cannot open output {} for writing: {reason}", path.display())]
    OutputOpen { path: PathBuf, reason: String },

    #[error("frame decode failed: {0}")]
    Decode(String),

    #[error("frame is {got:?} but the output is {expected:?} (width, height)")]
    FrameSize { expected: (u32, u32), got: (u32, u32) },

    #[error("output already finished")]
    OutputClosed,

    #[error("video backend: {0}")]
    Video(#[from] opencv::Error),

    #[error("detection oracle failed: {0}")]
    Oracle(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("detection log line {line}: {source}")]
    DetectionLog {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("segment count must be at least 1")]
    InvalidSegmentCount,

    #[error("cannot load font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
