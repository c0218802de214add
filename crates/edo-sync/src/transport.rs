use async_trait::async_trait;
use edo_index::TypeList;
use edo_types::{ElementKey, Fingerprint, StageId};

use crate::error::SyncResult;

/// Longest change id the remote accepts.
pub const CHANGE_ID_MAX: usize = 12;
/// Longest comment the remote accepts.
pub const COMMENT_MAX: usize = 40;

/// One entry of a remote stage listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteElement {
    pub key: ElementKey,
    pub fingerprint: Fingerprint,
}

/// Result of retrieving one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchedElement {
    Found {
        content: Vec<u8>,
        fingerprint: Fingerprint,
    },
    /// The element no longer exists in the stage.
    Deleted,
    /// The stage or the requested version is unknown to the remote.
    NotFound,
}

/// Change identification attached to an upload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeInfo {
    pub change_id: String,
    pub comment: String,
}

impl ChangeInfo {
    /// Both fields cut to the lengths the remote accepts.
    pub fn new(change_id: &str, comment: &str) -> Self {
        Self {
            change_id: change_id.chars().take(CHANGE_ID_MAX).collect(),
            comment: comment.chars().take(COMMENT_MAX).collect(),
        }
    }
}

/// An element upload.
#[derive(Clone, Debug)]
pub struct PushRequest<'a> {
    pub stage: &'a StageId,
    pub key: &'a ElementKey,
    pub content: &'a [u8],
    pub change: &'a ChangeInfo,
    /// Fingerprint the upload is based on. The remote refuses the upload
    /// when its own fingerprint differs.
    pub fingerprint: Option<&'a Fingerprint>,
}

/// Access to the upstream repository.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn element_list(&self, stage: &StageId) -> SyncResult<Vec<RemoteElement>>;
    async fn type_list(&self, stage: &StageId) -> SyncResult<TypeList>;
    /// Retrieve an element, at a given change level when `version` is set.
    async fn fetch_element(
        &self,
        stage: &StageId,
        key: &ElementKey,
        version: Option<&str>,
    ) -> SyncResult<FetchedElement>;
    /// The element's change history listing, if the remote has one.
    async fn fetch_history(&self, stage: &StageId, key: &ElementKey) -> SyncResult<Option<String>>;
    /// Upload new content and return the element's new fingerprint.
    async fn push_element(&self, request: PushRequest<'_>) -> SyncResult<Fingerprint>;
}
