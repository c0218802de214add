//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The stage name cannot be used as a ref.
    #[error("invalid stage name: {name}: {reason}")]
    InvalidStageName { name: String, reason: String },

    /// A pointer file exists but its content is unusable.
    #[error("corrupted repository state in {file}: {reason}")]
    CorruptState { file: String, reason: String },

    /// A malformed identifier was read or supplied.
    #[error(transparent)]
    Type(#[from] edo_types::TypeError),

    /// An in-memory backend lock was poisoned by a panicking writer.
    #[error("ref store lock poisoned")]
    LockPoisoned,

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
