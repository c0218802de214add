//! Download element contents into the remote index, then merge.

use edo_index::IndexStatus;
use edo_refs::Namespace;
use edo_store::ObjectKind;
use edo_types::{ElementKey, Fingerprint, ObjectKey, StageId};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::merge::MergeReport;
use crate::pool::settle_all;
use crate::report::BatchReport;
use crate::repository::Repository;
use crate::transport::{FetchedElement, RemoteTransport};

/// Result of downloading one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Downloaded {
    Updated {
        object: ObjectKey,
        fingerprint: Fingerprint,
        history: Option<ObjectKey>,
    },
    Deleted,
}

#[derive(Debug)]
pub struct PullOutcome {
    pub downloads: BatchReport<ElementKey, Downloaded>,
    /// The new remote index, if anything was downloaded.
    pub index: Option<ObjectKey>,
    pub merge: MergeReport,
}

impl Repository {
    async fn download(
        &self,
        remote: &dyn RemoteTransport,
        stage: &StageId,
        key: &ElementKey,
        with_history: bool,
    ) -> SyncResult<Downloaded> {
        let (content, fingerprint) = match remote.fetch_element(stage, key, None).await? {
            FetchedElement::Found {
                content,
                fingerprint,
            } => (content, fingerprint),
            FetchedElement::Deleted => return Ok(Downloaded::Deleted),
            FetchedElement::NotFound => {
                return Err(SyncError::Transport(format!("{key} not found in {stage}")))
            }
        };
        let object = self.store().put(ObjectKind::Blob, &content)?;
        let history = if with_history {
            match remote.fetch_history(stage, key).await? {
                Some(listing) => Some(self.indexes().store_history(&listing)?),
                None => None,
            }
        } else {
            None
        };
        debug!(element = %key, object = %object.short_hex(), "downloaded element");
        Ok(Downloaded::Updated {
            object,
            fingerprint,
            history,
        })
    }

    /// Download `keys`, or every element the last fetch marked, into a new
    /// remote index, then merge that index into the local stage.
    ///
    /// Failed downloads are reported and leave their element untouched.
    pub async fn pull(
        &self,
        remote: &dyn RemoteTransport,
        stage: &StageId,
        keys: &[ElementKey],
        with_history: bool,
    ) -> SyncResult<PullOutcome> {
        let (remote_key, remote_index) = self
            .indexes()
            .load_stage(Namespace::Remote, stage)?
            .ok_or_else(|| SyncError::RemoteNotFetched(stage.clone()))?;

        let targets: Vec<ElementKey> = if keys.is_empty() {
            remote_index
                .elements
                .iter()
                .filter(|(_, record)| record.fingerprint.is_none())
                .map(|(key, _)| key.clone())
                .collect()
        } else {
            keys.to_vec()
        };

        let tasks = targets.into_iter().map(|key| async move {
            let result = self.download(remote, stage, &key, with_history).await;
            (key, result)
        });
        let mut downloads = BatchReport::new();
        for (key, result) in settle_all(tasks, self.config().concurrency).await {
            downloads.record(key, result);
        }

        let mut index = remote_index.successor(remote_key, IndexStatus::Pull, "pull");
        for (key, downloaded) in &downloads.succeeded {
            match downloaded {
                Downloaded::Updated {
                    object,
                    fingerprint,
                    history,
                } => {
                    let record = index.elements.entry(key.clone()).or_default();
                    record.local = Some(*object);
                    record.base = Some(*object);
                    record.fingerprint = Some(fingerprint.clone());
                    if history.is_some() {
                        record.history = *history;
                    }
                }
                Downloaded::Deleted => {
                    index.elements.remove(key);
                }
            }
        }

        let (index_key, merge_target) = if downloads.succeeded.is_empty() {
            (None, remote_key)
        } else {
            let key = self.indexes().commit_index(Namespace::Remote, &index)?;
            (Some(key), key)
        };
        info!(%stage, report = %downloads, "pulled stage");

        let target = merge_target.to_hex();
        let merge = self.merge(stage.as_str(), Some(target.as_str())).await?;
        Ok(PullOutcome {
            downloads,
            index: index_key,
            merge,
        })
    }
}
