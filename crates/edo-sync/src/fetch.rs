//! Refresh remote indexes from the upstream element listings.

use std::collections::BTreeMap;

use edo_index::{Index, IndexStatus};
use edo_refs::Namespace;
use edo_types::{ElementKey, ObjectKey, StageId};
use tracing::info;

use crate::error::SyncResult;
use crate::pool::settle_all;
use crate::report::BatchReport;
use crate::repository::Repository;
use crate::topology::StageTopology;
use crate::transport::RemoteTransport;

/// What fetching one stage changed in its remote index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    pub index: ObjectKey,
    /// Known elements whose fingerprint moved; they await a pull.
    pub changed: Vec<ElementKey>,
    /// Elements seen for the first time.
    pub added: Vec<ElementKey>,
    /// Elements no longer listed by the remote.
    pub dropped: Vec<ElementKey>,
}

impl Repository {
    /// Fetch one stage and advance its remote ref.
    pub async fn fetch_stage(
        &self,
        remote: &dyn RemoteTransport,
        stage: &StageId,
    ) -> SyncResult<FetchOutcome> {
        let listing = remote.element_list(stage).await?;
        let types = remote.type_list(stage).await?;
        let type_key = self.indexes().store_type_list(&types)?;

        let mut index = match self.indexes().load_stage(Namespace::Remote, stage)? {
            Some((key, previous)) => previous.successor(key, IndexStatus::Fetch, "fetch"),
            None => {
                let mut index = Index::new(stage.clone(), IndexStatus::Fetch);
                index.message = "fetch".into();
                index
            }
        };
        index.type_list = Some(type_key);

        let mut known = std::mem::take(&mut index.elements);
        let mut elements = BTreeMap::new();
        let (mut changed, mut added) = (Vec::new(), Vec::new());
        for item in listing {
            let record = match known.remove(&item.key) {
                Some(mut record) => {
                    if record.fingerprint.as_ref() != Some(&item.fingerprint) {
                        // A cleared fingerprint marks the element for pull.
                        record.fingerprint = None;
                        changed.push(item.key.clone());
                    }
                    record
                }
                None => {
                    added.push(item.key.clone());
                    Default::default()
                }
            };
            elements.insert(item.key, record);
        }
        index.elements = elements;
        let dropped: Vec<ElementKey> = known.into_keys().collect();

        let key = self.indexes().commit_index(Namespace::Remote, &index)?;
        info!(
            %stage,
            changed = changed.len(),
            added = added.len(),
            dropped = dropped.len(),
            "fetched stage"
        );
        Ok(FetchOutcome {
            index: key,
            changed,
            added,
            dropped,
        })
    }

    /// Fetch `stage`, or with a topology every stage on its promotion path.
    /// Each stage succeeds or fails on its own.
    pub async fn fetch(
        &self,
        remote: &dyn RemoteTransport,
        stage: &StageId,
        topology: Option<&dyn StageTopology>,
    ) -> BatchReport<StageId, FetchOutcome> {
        let stages = match topology {
            Some(map) => map.ordered_stage_chain(stage),
            None => vec![stage.clone()],
        };
        let tasks = stages.into_iter().map(|stage| async move {
            let result = self.fetch_stage(remote, &stage).await;
            (stage, result)
        });

        let mut report = BatchReport::new();
        for (stage, result) in settle_all(tasks, self.config().concurrency).await {
            report.record(stage, result);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRemote;
    use crate::repository::fixtures;
    use crate::topology::StaticTopology;
    use edo_index::{DataFormat, ElementRecord, TypeList, TypeRecord};

    fn stage() -> StageId {
        StageId::parse("DEV-1-SYS-SUB").unwrap()
    }

    fn key(s: &str) -> ElementKey {
        ElementKey::parse(s).unwrap()
    }

    fn types() -> TypeList {
        [TypeRecord {
            type_name: "COBOL".into(),
            data_format: DataFormat::Text,
            record_length: 80,
        }]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn first_fetch_lists_everything_unpulled() {
        let (_tmp, repo) = fixtures::repo();
        let remote = InMemoryRemote::new();
        remote.set_types(&stage(), types()).unwrap();
        remote.put_element(&stage(), &key("COBOL/A"), b"a").unwrap();
        remote.put_element(&stage(), &key("COBOL/B"), b"b").unwrap();

        let outcome = repo.fetch_stage(&remote, &stage()).await.unwrap();
        assert_eq!(outcome.added, vec![key("COBOL/A"), key("COBOL/B")]);

        let (_, index) = repo.indexes().load("remote/DEV-1-SYS-SUB").unwrap();
        assert_eq!(index.status, IndexStatus::Fetch);
        assert!(index.elements.values().all(|r| *r == ElementRecord::default()));
        assert_eq!(repo.indexes().read_type_list(&index).unwrap(), types());
    }

    #[tokio::test]
    async fn refetch_clears_moved_fingerprints_and_drops_missing() {
        let (_tmp, repo) = fixtures::repo();
        let remote = InMemoryRemote::new();
        let fp_a = remote.put_element(&stage(), &key("COBOL/A"), b"a").unwrap();
        let fp_b = remote.put_element(&stage(), &key("COBOL/B"), b"b").unwrap();
        remote.put_element(&stage(), &key("COBOL/GONE"), b"g").unwrap();

        // Pretend everything was pulled at the current fingerprints.
        let mut pulled = Index::new(stage(), IndexStatus::Pull);
        for (k, fp) in [("COBOL/A", fp_a), ("COBOL/B", fp_b.clone())] {
            let object = ObjectKey::digest(k.as_bytes());
            pulled.elements.insert(key(k), ElementRecord::synced(object, Some(fp)));
        }
        pulled.elements.insert(key("COBOL/GONE"), ElementRecord::default());
        let first = repo.indexes().commit_index(Namespace::Remote, &pulled).unwrap();

        remote.put_element(&stage(), &key("COBOL/A"), b"a2").unwrap();
        remote.remove_element(&stage(), &key("COBOL/GONE")).unwrap();
        remote.put_element(&stage(), &key("COBOL/NEW"), b"n").unwrap();

        let outcome = repo.fetch_stage(&remote, &stage()).await.unwrap();
        assert_eq!(outcome.changed, vec![key("COBOL/A")]);
        assert_eq!(outcome.added, vec![key("COBOL/NEW")]);
        assert_eq!(outcome.dropped, vec![key("COBOL/GONE")]);

        let index = repo.indexes().read_index(&outcome.index).unwrap();
        assert_eq!(index.prev, edo_index::Parent::Index(first));
        assert_eq!(index.elements[&key("COBOL/A")].fingerprint, None);
        assert!(index.elements[&key("COBOL/A")].base.is_some());
        assert_eq!(index.elements[&key("COBOL/B")].fingerprint, Some(fp_b));
    }

    #[tokio::test]
    async fn topology_fetch_settles_each_stage() {
        let (_tmp, repo) = fixtures::repo();
        let remote = InMemoryRemote::new();
        let qa = StageId::parse("QA-1-SYS-SUB").unwrap();
        let prod = StageId::parse("PRD-1-SYS-SUB").unwrap();
        remote.put_element(&stage(), &key("COBOL/A"), b"a").unwrap();
        remote.put_element(&qa, &key("COBOL/A"), b"a").unwrap();
        // PRD is unknown to the remote and fails.
        let map = StaticTopology::new()
            .link(stage(), qa.clone())
            .link(qa.clone(), prod.clone());

        let report = repo.fetch(&remote, &stage(), Some(&map)).await;
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, prod);
        assert!(repo.indexes().resolve("remote/QA-1-SYS-SUB").is_ok());
    }
}
