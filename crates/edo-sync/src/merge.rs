//! Stage-level merge of a remote index into the local stage.

use std::collections::BTreeSet;

use edo_index::{ElementRecord, Index, IndexError, IndexStatus, Parent};
use edo_merge::{reconcile, ContentKind, LocalSide, MergeOptions, MergeStatus};
use edo_refs::Namespace;
use edo_store::blob_key;
use edo_types::{ElementKey, ObjectKey, StageId};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::pool::settle_all;
use crate::report::BatchReport;
use crate::repository::Repository;

#[derive(Debug)]
pub struct MergeReport {
    pub stage: StageId,
    /// The remote index that was merged.
    pub remote: ObjectKey,
    /// The local stage did not exist and was created from the remote.
    pub cloned: bool,
    pub elements: BatchReport<ElementKey, MergeStatus>,
    pub conflicts: Vec<ElementKey>,
}

impl Repository {
    async fn merge_element(
        &self,
        key: &ElementKey,
        local: Option<&ElementRecord>,
        remote: Option<&ElementRecord>,
        content: ContentKind,
        opts: &MergeOptions,
    ) -> SyncResult<MergeStatus> {
        let remote_version = match remote {
            None => None,
            Some(record) => match record.current() {
                Some(object) => Some(object),
                // Listed by the remote but never downloaded.
                None => return Ok(MergeStatus::UpToDate),
            },
        };

        let working = self.read_working(key).await?;
        let side = match &working {
            Some(content) => LocalSide::working(blob_key(content), content),
            None => LocalSide::stored(local.and_then(ElementRecord::current)),
        };
        let base = local.and_then(|record| record.base);
        let result = reconcile(self.store(), side, base, remote_version, content, opts)?;

        if let Some(output) = &result.output {
            if working.as_deref() != Some(output.as_slice()) {
                self.write_working(key, output).await?;
            }
        }
        debug!(element = %key, status = %result.status, "merged element");
        Ok(result.status)
    }

    /// Resolve the local side of a merge: an existing index, or a stage
    /// that has no local ref yet.
    fn merge_target(&self, local: &str) -> SyncResult<(StageId, Option<(ObjectKey, Index)>)> {
        match self.indexes().load(local) {
            Ok((key, index)) => Ok((index.stage.clone(), Some((key, index)))),
            Err(IndexError::ReferenceNotFound(_)) => Ok((StageId::parse(local)?, None)),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge a remote index into a local stage.
    ///
    /// `local` names a stage or an index key. `remote` names the index to
    /// merge and defaults to the remote ref of the same stage. Every element
    /// is reconciled against its working file and the outcome recorded in
    /// `MERGE` and `MERGE_CONFLICT` for the following commit. Elements of
    /// binary types are never line-merged: when both sides changed, the
    /// working file is left alone and the element reported as a conflict.
    pub async fn merge(&self, local: &str, remote: Option<&str>) -> SyncResult<MergeReport> {
        let (stage, local_state) = self.merge_target(local)?;
        let (remote_key, remote_index) = match remote {
            Some(name) => self.indexes().load(name)?,
            None => self
                .indexes()
                .load_stage(Namespace::Remote, &stage)?
                .ok_or_else(|| SyncError::RemoteNotFetched(stage.clone()))?,
        };

        let Some((_, local_index)) = local_state else {
            return self.clone_stage(stage, remote_key, remote_index).await;
        };

        let keys: BTreeSet<&ElementKey> = local_index
            .elements
            .keys()
            .chain(remote_index.elements.keys())
            .collect();
        // Data formats come from the remote's type list when it has one.
        let types = if remote_index.type_list.is_some() {
            self.indexes().read_type_list(&remote_index)?
        } else {
            self.indexes().read_type_list(&local_index)?
        };
        let opts = self.merge_options();
        let (local_ref, remote_ref, types, opts) = (&local_index, &remote_index, &types, &opts);
        let tasks = keys.into_iter().map(|key| async move {
            let content = if types.is_binary(key.type_name()) {
                ContentKind::Binary
            } else {
                ContentKind::Text
            };
            let result = self
                .merge_element(key, local_ref.get(key), remote_ref.get(key), content, opts)
                .await;
            (key.clone(), result)
        });

        let mut elements = BatchReport::new();
        for (key, result) in settle_all(tasks, self.config().concurrency).await {
            elements.record(key, result);
        }
        let conflicts: Vec<ElementKey> = elements
            .succeeded
            .iter()
            .filter(|(_, status)| status.is_conflict())
            .map(|(key, _)| key.clone())
            .collect();

        self.refs().set_merge_head(Some(&remote_key))?;
        self.refs().set_conflicts(&conflicts)?;
        info!(
            %stage,
            remote = %remote_key.short_hex(),
            report = %elements,
            conflicts = conflicts.len(),
            "merge finished"
        );
        Ok(MergeReport {
            stage,
            remote: remote_key,
            cloned: false,
            elements,
            conflicts,
        })
    }

    /// Create the local stage as a copy of the remote index.
    async fn clone_stage(
        &self,
        stage: StageId,
        remote_key: ObjectKey,
        remote_index: Index,
    ) -> SyncResult<MergeReport> {
        let mut index = remote_index;
        index.prev = Parent::Root;
        index.status = IndexStatus::Merge;
        index.message = format!("clone of remote {}", remote_key.short_hex());
        index.stage = stage.clone();

        let mut elements = BatchReport::new();
        for (key, record) in &index.elements {
            if let Some(object) = record.current() {
                let result = self.materialize(key, &object).await;
                elements.record(key.clone(), result.map(|()| MergeStatus::Merged));
            }
        }
        self.indexes().commit_index(Namespace::Local, &index)?;
        self.refs().set_merge_head(None)?;
        self.refs().set_conflicts(&[])?;
        info!(%stage, remote = %remote_key.short_hex(), "created local stage from remote");
        Ok(MergeReport {
            stage,
            remote: remote_key,
            cloned: true,
            elements,
            conflicts: Vec::new(),
        })
    }
}
