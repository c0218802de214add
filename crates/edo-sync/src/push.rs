//! Upload committed changes to the remote stage.

use edo_diff::{diff_indexes, fingerprint_diff, ChangeKind};
use edo_index::{IndexError, IndexStatus};
use edo_refs::Namespace;
use edo_store::ObjectKind;
use edo_types::{ElementKey, Fingerprint, ObjectKey, StageId};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::pool::settle_all;
use crate::report::BatchReport;
use crate::repository::Repository;
use crate::transport::{ChangeInfo, PushRequest, RemoteTransport};

#[derive(Debug)]
pub struct PushOutcome {
    /// New remote fingerprint per uploaded element.
    pub elements: BatchReport<ElementKey, Fingerprint>,
    /// New local and remote index keys, if anything was uploaded.
    pub indexes: Option<(ObjectKey, ObjectKey)>,
}

/// One element selected for upload.
struct Upload {
    key: ElementKey,
    object: ObjectKey,
    fingerprint: Option<Fingerprint>,
}

impl Repository {
    async fn upload(
        &self,
        remote: &dyn RemoteTransport,
        stage: &StageId,
        change: &ChangeInfo,
        item: &Upload,
    ) -> SyncResult<Fingerprint> {
        let content = self.store().get(&item.object, Some(ObjectKind::Blob))?;
        let fingerprint = remote
            .push_element(PushRequest {
                stage,
                key: &item.key,
                content: &content,
                change,
                fingerprint: item.fingerprint.as_ref(),
            })
            .await?;
        debug!(element = %item.key, %fingerprint, "pushed element");
        Ok(fingerprint)
    }

    /// Push every element whose local version differs from the remote
    /// index, or only `keys` when given.
    ///
    /// Refused with [`SyncError::Unsynchronized`] while any fingerprint
    /// differs between the two indexes. Elements that exist on one side
    /// only are not pushed.
    pub async fn push(
        &self,
        remote: &dyn RemoteTransport,
        stage: &StageId,
        change: &ChangeInfo,
        keys: &[ElementKey],
    ) -> SyncResult<PushOutcome> {
        let (local_key, local) = self
            .indexes()
            .load_stage(Namespace::Local, stage)?
            .ok_or_else(|| IndexError::ReferenceNotFound(stage.to_string()))?;
        let (remote_key, remote_index) = self
            .indexes()
            .load_stage(Namespace::Remote, stage)?
            .ok_or_else(|| SyncError::RemoteNotFetched(stage.clone()))?;

        let moved = fingerprint_diff(&local, &remote_index);
        if !moved.is_empty() {
            return Err(SyncError::Unsynchronized {
                stage: stage.clone(),
                elements: moved,
            });
        }

        let uploads: Vec<Upload> = diff_indexes(&local, &remote_index, false)
            .into_iter()
            .filter(|(key, change)| {
                change.kind() == ChangeKind::Modified && (keys.is_empty() || keys.contains(key))
            })
            .filter_map(|(key, change)| {
                let object = change.new.key()?;
                let fingerprint = local.get(&key)?.fingerprint.clone();
                Some(Upload {
                    key,
                    object,
                    fingerprint,
                })
            })
            .collect();
        if uploads.is_empty() {
            info!(%stage, "nothing to push");
            return Ok(PushOutcome {
                elements: BatchReport::new(),
                indexes: None,
            });
        }

        let tasks = uploads
            .iter()
            .map(|item| self.upload(remote, stage, change, item));
        let results = settle_all(tasks, self.config().concurrency).await;

        let mut local_next = local.successor(local_key, IndexStatus::Push, &change.comment);
        let mut remote_next = remote_index.successor(remote_key, IndexStatus::Push, &change.comment);
        let mut elements = BatchReport::new();
        for (item, result) in uploads.into_iter().zip(results) {
            if let Ok(fingerprint) = &result {
                if let Some(record) = local_next.elements.get_mut(&item.key) {
                    record.fingerprint = Some(fingerprint.clone());
                }
                if let Some(record) = remote_next.elements.get_mut(&item.key) {
                    record.local = Some(item.object);
                    record.fingerprint = Some(fingerprint.clone());
                }
            }
            elements.record(item.key, result);
        }

        let indexes = if elements.succeeded.is_empty() {
            None
        } else {
            let local_key = self.indexes().commit_index(Namespace::Local, &local_next)?;
            let remote_key = self.indexes().commit_index(Namespace::Remote, &remote_next)?;
            Some((local_key, remote_key))
        };
        info!(%stage, change_id = %change.change_id, report = %elements, "pushed stage");
        Ok(PushOutcome { elements, indexes })
    }
}
