//! Error types for repository workflows.

use std::path::PathBuf;

use edo_types::{ElementKey, StageId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] edo_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] edo_refs::RefError),

    #[error("index error: {0}")]
    Index(#[from] edo_index::IndexError),

    #[error("diff error: {0}")]
    Diff(#[from] edo_diff::DiffError),

    #[error("merge error: {0}")]
    Merge(#[from] edo_merge::MergeError),

    #[error(transparent)]
    Type(#[from] edo_types::TypeError),

    /// The remote rejected or failed a request.
    #[error("transport error: {0}")]
    Transport(String),

    /// Elements changed on the remote since the local index last saw them.
    #[error("stage {stage} is not in sync with the remote ({} element(s) moved); merge and commit first", .elements.len())]
    Unsynchronized {
        stage: StageId,
        elements: Vec<ElementKey>,
    },

    /// The working directory has changes that would be lost.
    #[error("uncommitted changes in {} element(s)", .0.len())]
    WorkingChanges(Vec<ElementKey>),

    #[error("no stage is checked out")]
    NothingCheckedOut,

    #[error("checkout is detached at {0}; check out a stage first")]
    Detached(edo_types::ObjectKey),

    #[error("element {0} is not tracked by the checked-out index")]
    Untracked(ElementKey),

    #[error("remote stage {0} has not been fetched")]
    RemoteNotFetched(StageId),

    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("config encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
