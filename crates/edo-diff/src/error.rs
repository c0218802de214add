//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] edo_store::StoreError),

    /// Walking the working directory failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Reading a working file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
