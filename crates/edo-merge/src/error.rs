//! Error types for the merge crate.

/// Errors that can occur while reconciling an element.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Loading one of the versions failed.
    #[error("store error: {0}")]
    Store(#[from] edo_store::StoreError),

    /// A version taking part in a three-way merge is not UTF-8 text.
    #[error("{side} version is not text and cannot be merged line by line")]
    NotText { side: &'static str },
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
