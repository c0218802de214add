//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A stored record does not follow its line grammar.
    #[error("malformed {record} record at line {line}: {reason}")]
    MalformedRecord {
        record: &'static str,
        line: usize,
        reason: String,
    },

    /// A name resolves to neither an index key nor a ref.
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// The history chain ends before the requested depth.
    #[error("{name} has only {available} ancestor(s), {requested} requested")]
    HistoryExhausted {
        name: String,
        requested: usize,
        available: usize,
    },

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] edo_store::StoreError),

    /// Ref operation failed.
    #[error("ref error: {0}")]
    Ref(#[from] edo_refs::RefError),
}

impl IndexError {
    pub(crate) fn malformed(record: &'static str, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record,
            line,
            reason: reason.into(),
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
