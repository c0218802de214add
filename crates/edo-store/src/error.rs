use edo_types::ObjectKey;

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectKey),

    /// The stored frame does not hash to its key (data corruption).
    #[error("integrity check failed for {key}: content hashes to {computed}")]
    IntegrityMismatch { key: ObjectKey, computed: ObjectKey },

    /// The object exists but is of a different kind than requested.
    #[error("object {key} is a {actual}, expected {expected}")]
    KindMismatch {
        key: ObjectKey,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// The frame header is malformed.
    #[error("corrupt object {key}: {reason}")]
    CorruptObject { key: ObjectKey, reason: String },

    /// An in-memory backend lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
