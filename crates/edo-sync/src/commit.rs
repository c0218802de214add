//! Record working-directory changes as a new local index.

use edo_diff::{diff_workdir, fingerprint_diff};
use edo_index::{IndexError, IndexStatus};
use edo_refs::Namespace;
use edo_store::ObjectKind;
use edo_types::{ElementKey, ObjectKey, StageId};
use tracing::info;

use crate::error::SyncResult;
use crate::repository::Repository;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// The new local index; `None` when there was nothing to commit.
    pub index: Option<ObjectKey>,
    pub committed: Vec<ElementKey>,
    pub removed: Vec<ElementKey>,
    /// Conflicts from the last merge that are still unresolved.
    pub conflicts: Vec<ElementKey>,
    /// The pending merge was fully absorbed and `MERGE` cleared.
    pub merge_cleared: bool,
}

impl Repository {
    /// Commit working-directory changes to the local stage.
    ///
    /// Only tracked elements are committed unless `all` is set, which also
    /// adds new files and drops deleted ones. `paths` limits the commit to
    /// the given elements. Elements brought in by a pending merge take
    /// their base and fingerprint from the merged index, so that once every
    /// conflict is committed the stage is in sync with the remote again.
    pub async fn commit(
        &self,
        stage: &StageId,
        paths: &[ElementKey],
        message: &str,
        all: bool,
    ) -> SyncResult<CommitOutcome> {
        let (old_key, old) = self
            .indexes()
            .load_stage(Namespace::Local, stage)?
            .ok_or_else(|| IndexError::ReferenceNotFound(stage.to_string()))?;
        let types = self.indexes().read_type_list(&old)?;
        let changes = diff_workdir(self.handle(), &types, &old, false)?;
        let mut merging = match self.refs().merge_head()? {
            Some(key) => Some(self.indexes().read_index(&key)?),
            None => None,
        };
        let same_stage = merging.as_ref().is_some_and(|m| m.stage == old.stage);

        let mut index = old.successor(old_key, IndexStatus::Commit, message);
        let mut outcome = CommitOutcome {
            conflicts: self.refs().conflicts()?,
            ..Default::default()
        };
        let mut updated = false;

        if changes.is_empty() {
            if let Some(merged) = &merging {
                // Conflicts resolved to exactly the committed content.
                for (key, record) in index.elements.iter_mut() {
                    if let Some(theirs) = merged.get(key).filter(|t| t.fingerprint.is_some()) {
                        record.fingerprint = theirs.fingerprint.clone();
                    }
                }
                outcome.conflicts.clear();
                updated = true;
            }
        }

        for (key, change) in &changes {
            if !paths.is_empty() && !paths.contains(key) {
                continue;
            }
            if change.new.is_absent() {
                if all {
                    index.elements.remove(key);
                    outcome.removed.push(key.clone());
                    outcome.conflicts.retain(|k| k != key);
                    updated = true;
                }
                continue;
            }

            let tracked = index.elements.contains_key(key);
            let from_merge = merging.as_ref().is_some_and(|m| m.elements.contains_key(key));
            if !(tracked || all || from_merge) {
                continue;
            }
            let Some(content) = self.read_working(key).await? else {
                continue;
            };
            let object = self.store().put(ObjectKind::Blob, &content)?;
            let theirs = merging.as_mut().and_then(|m| m.elements.remove(key));

            let record = index.elements.entry(key.clone()).or_default();
            record.local = Some(object);
            if let Some(theirs) = theirs {
                if same_stage {
                    record.base = theirs.base;
                }
                record.fingerprint = theirs.fingerprint;
            }
            if record.base.is_none() {
                record.base = Some(object);
            }
            outcome.committed.push(key.clone());
            outcome.conflicts.retain(|k| k != key);
            updated = true;
        }

        if !updated {
            info!(%stage, "nothing to commit");
            return Ok(outcome);
        }

        let key = self.indexes().commit_index(Namespace::Local, &index)?;
        outcome.index = Some(key);
        if let Some(merged) = &merging {
            if outcome.conflicts.is_empty() && fingerprint_diff(&index, merged).is_empty() {
                self.refs().set_merge_head(None)?;
                outcome.merge_cleared = true;
            }
        }
        self.refs().set_conflicts(&outcome.conflicts)?;
        info!(
            %stage,
            index = %key.short_hex(),
            committed = outcome.committed.len(),
            removed = outcome.removed.len(),
            conflicts = outcome.conflicts.len(),
            "committed"
        );
        Ok(outcome)
    }
}
