//! Error types the dispatch router recovers from by kind
//!
//! Everything else travels as `anyhow::Error` and is reported at the
//! handler or scheduler tick boundary.

use thiserror::Error;

/// The intent classifier could not produce a label
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("intent classifier has not been trained")]
    NotTrained,
    #[error("input contains no known vocabulary")]
    EmptyFeatures,
    #[error("no training examples available")]
    NoExamples,
}

/// A completion reply did not decode into the structure a handler expected
#[derive(Debug, Error)]
pub enum HandlerFormatError {
    #[error("completion did not contain a JSON object")]
    MissingObject,
    #[error("completion JSON did not match the expected shape: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("unrecognised reminder time `{0}`")]
    InvalidTime(String),
    #[error("reminder message is empty")]
    EmptyMessage,
    #[error("reminder time {0} is in the past")]
    PastTime(String),
}

/// Voice playback could not start
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no media player command is configured")]
    NotConfigured,
}
