//! Per-element reconciliation of a local version with a pulled remote one.

use edo_store::{ObjectKind, ObjectStore};
use edo_types::ObjectKey;
use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::status::MergeStatus;
use crate::three_way::{merge_buffers, MergeOptions};

/// What reconciling an element requires, decided from keys alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// The remote no longer has the element.
    Deleted,
    /// Local and remote agree, or the local side has no edits: take remote.
    TakeRemote,
    /// The remote has not moved since the last sync.
    UpToDate,
    /// Both sides changed; merge the contents.
    ThreeWay,
}

/// The local side of a reconciliation.
///
/// `content`, when present, is the live working file and takes precedence
/// over loading `key` from the store. `key` is then the working file's hash.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalSide<'a> {
    pub key: Option<ObjectKey>,
    pub content: Option<&'a [u8]>,
}

impl<'a> LocalSide<'a> {
    pub fn stored(key: Option<ObjectKey>) -> Self {
        Self { key, content: None }
    }

    pub fn working(key: ObjectKey, content: &'a [u8]) -> Self {
        Self {
            key: Some(key),
            content: Some(content),
        }
    }
}

/// How an element's content may be combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentKind {
    /// Line-oriented text: divergent versions are merged line by line.
    #[default]
    Text,
    /// Opaque bytes: divergent versions are left for the user.
    Binary,
}

/// Result of reconciling one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub status: MergeStatus,
    /// Content to write to the working file, if any.
    pub output: Option<Vec<u8>>,
}

/// Decide how to reconcile from the local, base and remote keys.
pub fn plan(
    local: Option<ObjectKey>,
    base: Option<ObjectKey>,
    remote: Option<ObjectKey>,
) -> ReconcilePlan {
    let Some(remote) = remote else {
        return ReconcilePlan::Deleted;
    };
    if local == Some(remote) || base == local {
        ReconcilePlan::TakeRemote
    } else if base == Some(remote) {
        ReconcilePlan::UpToDate
    } else {
        ReconcilePlan::ThreeWay
    }
}

fn load_text(
    store: &dyn ObjectStore,
    key: Option<&ObjectKey>,
    side: &'static str,
) -> MergeResult<String> {
    let bytes = match key {
        Some(key) => store.get(key, Some(ObjectKind::Blob))?,
        None => Vec::new(),
    };
    String::from_utf8(bytes).map_err(|_| MergeError::NotText { side })
}

/// Reconcile one element, loading contents from `store` as needed.
///
/// A missing base merges against empty text. A three-way merge of text
/// always yields output, conflict markers included. Binary content that
/// diverged on both sides is a conflict with nothing written.
pub fn reconcile(
    store: &dyn ObjectStore,
    local: LocalSide<'_>,
    base: Option<ObjectKey>,
    remote: Option<ObjectKey>,
    content: ContentKind,
    opts: &MergeOptions,
) -> MergeResult<Reconciliation> {
    let decision = plan(local.key, base, remote);
    debug!(?decision, ?content, "reconciling element");
    match (decision, remote) {
        (ReconcilePlan::Deleted, _) | (_, None) => Ok(Reconciliation {
            status: MergeStatus::Deleted,
            output: None,
        }),
        (ReconcilePlan::UpToDate, _) => Ok(Reconciliation {
            status: MergeStatus::UpToDate,
            output: None,
        }),
        (ReconcilePlan::TakeRemote, Some(remote)) => Ok(Reconciliation {
            status: MergeStatus::Merged,
            output: Some(store.get(&remote, Some(ObjectKind::Blob))?),
        }),
        (ReconcilePlan::ThreeWay, _) if content == ContentKind::Binary => Ok(Reconciliation {
            status: MergeStatus::Conflict,
            output: None,
        }),
        (ReconcilePlan::ThreeWay, Some(remote)) => {
            let base_text = load_text(store, base.as_ref(), "base")?;
            let remote_text = load_text(store, Some(&remote), "remote")?;
            let local_text = match local.content {
                Some(content) => std::str::from_utf8(content)
                    .map_err(|_| MergeError::NotText { side: "local" })?
                    .to_string(),
                None => load_text(store, local.key.as_ref(), "local")?,
            };
            let merged = merge_buffers(&base_text, &local_text, &remote_text, opts);
            Ok(Reconciliation {
                status: merged.status,
                output: Some(merged.text.into_bytes()),
            })
        }
    }
}
