use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid element key {key:?}: {reason}")]
    InvalidElementKey { key: String, reason: String },

    #[error("invalid stage {stage:?}: {reason}")]
    InvalidStage { stage: String, reason: String },

    #[error("invalid fingerprint {0:?}")]
    InvalidFingerprint(String),

    #[error("not an edo repository (or any parent up to /): {}", .0.display())]
    RepositoryNotFound(PathBuf),
}
