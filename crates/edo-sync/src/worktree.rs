//! Working-copy management: checkout, status, reset, restore and log.

use edo_diff::{diff_indexes, diff_self, diff_workdir, fingerprint_diff, ChangeSet};
use edo_index::{Index, IndexError, Parent};
use edo_refs::{Checkout, CheckoutTarget, Namespace};
use edo_types::{ElementKey, ObjectKey, StageId};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::report::BatchReport;
use crate::repository::Repository;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub checkout: Checkout,
    /// Clean working files of the previous checkout that were removed.
    pub removed: usize,
    pub written: usize,
}

/// Snapshot of the working copy relative to the checked-out index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub checkout: Option<CheckoutTarget>,
    /// Working files against the checked-out index.
    pub working: ChangeSet,
    /// Committed versions not yet on the remote. Against the remote index
    /// when one was fetched, otherwise against each element's base.
    pub unpushed: ChangeSet,
    /// Elements whose remote fingerprint moved since the last merge.
    pub remote_moved: Vec<ElementKey>,
    pub merge_head: Option<ObjectKey>,
    pub conflicts: Vec<ElementKey>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.working.is_empty()
            && self.unpushed.is_empty()
            && self.remote_moved.is_empty()
            && self.merge_head.is_none()
    }
}

impl Repository {
    /// The checked-out index, or an error when there is none.
    fn current_index(&self) -> SyncResult<(CheckoutTarget, Index)> {
        match self.checked_out()? {
            Some((target, Some(index))) => Ok((target, index)),
            Some((CheckoutTarget::Unborn(stage), None)) => {
                Err(IndexError::ReferenceNotFound(stage.to_string()).into())
            }
            _ => Err(SyncError::NothingCheckedOut),
        }
    }

    /// Tracked elements whose working file differs from `index`.
    fn tracked_changes(&self, index: &Index) -> SyncResult<Vec<ElementKey>> {
        let types = self.indexes().read_type_list(index)?;
        let changes = diff_workdir(self.handle(), &types, index, false)?;
        Ok(changes
            .into_keys()
            .filter(|key| index.elements.contains_key(key))
            .collect())
    }

    /// Switch the working directory to `target`, a stage name or index key.
    ///
    /// Refused while tracked files of the current checkout have
    /// uncommitted changes. Untracked files are left alone. A stage without
    /// a local ref is checked out unborn and populated by the next merge.
    pub async fn checkout(&self, target: &str) -> SyncResult<CheckoutOutcome> {
        let checkout = Checkout::parse(target)?;
        let next = match &checkout {
            Checkout::Stage(stage) => self
                .indexes()
                .load_stage(Namespace::Local, stage)?
                .map(|(_, index)| index),
            Checkout::Detached(key) => Some(self.indexes().read_index(key)?),
        };

        let mut removed = 0;
        if let Some((_, Some(current))) = self.checked_out()? {
            let dirty = self.tracked_changes(&current)?;
            if !dirty.is_empty() {
                return Err(SyncError::WorkingChanges(dirty));
            }
            for (key, record) in &current.elements {
                if record.current().is_some() && self.remove_working(key).await? {
                    removed += 1;
                }
            }
        }

        let written = match &next {
            Some(index) => self.materialize_index(index).await?,
            None => 0,
        };
        self.refs().set_checkout(&checkout)?;
        info!(checkout = %checkout.render(), removed, written, "checked out");
        Ok(CheckoutOutcome {
            checkout,
            removed,
            written,
        })
    }

    pub fn status(&self) -> SyncResult<StatusReport> {
        let mut report = StatusReport {
            merge_head: self.refs().merge_head()?,
            conflicts: self.refs().conflicts()?,
            ..Default::default()
        };
        let Some((target, index)) = self.checked_out()? else {
            return Ok(report);
        };
        report.checkout = Some(target);
        let Some(index) = index else {
            return Ok(report);
        };

        let types = self.indexes().read_type_list(&index)?;
        report.working = diff_workdir(self.handle(), &types, &index, false)?;
        match self.indexes().load_stage(Namespace::Remote, &index.stage)? {
            Some((_, remote)) => {
                report.unpushed = diff_indexes(&index, &remote, false)
                    .into_iter()
                    .filter(|(key, _)| remote.elements.contains_key(key))
                    .collect();
                report.remote_moved = fingerprint_diff(&index, &remote);
            }
            None => report.unpushed = diff_self(&index),
        }
        Ok(report)
    }

    /// Move the local ref of `stage` back `n` indexes. With `discard` the
    /// working files are rewritten to match; otherwise they are kept and
    /// show up as changes.
    pub async fn reset(&self, stage: &StageId, n: usize, discard: bool) -> SyncResult<ObjectKey> {
        let (current_key, current) = self
            .indexes()
            .load_stage(Namespace::Local, stage)?
            .ok_or_else(|| IndexError::ReferenceNotFound(stage.to_string()))?;
        if n == 0 && !discard {
            return Ok(current_key);
        }

        let target = self.indexes().walk_back(stage.as_str(), n)?;
        // Re-storing keeps the key unless the chain was truncated.
        let key = self.indexes().store_index(&target)?;
        self.refs().advance(Namespace::Local, stage, &key)?;

        if discard {
            for (element, record) in &current.elements {
                if record.current().is_some() && !target.elements.contains_key(element) {
                    self.remove_working(element).await?;
                }
            }
            self.materialize_index(&target).await?;
        }
        info!(%stage, n, discard, key = %key.short_hex(), "reset stage");
        Ok(key)
    }

    /// Rewrite working files of `keys` from the checked-out index. An
    /// element without content there has its working file removed.
    pub async fn restore(&self, keys: &[ElementKey]) -> SyncResult<BatchReport<ElementKey, ()>> {
        let (_, index) = self.current_index()?;
        let mut report = BatchReport::new();
        for key in keys {
            let result = match index.get(key) {
                None => Err(SyncError::Untracked(key.clone())),
                Some(record) => match record.current() {
                    Some(object) => self.materialize(key, &object).await,
                    None => self.remove_working(key).await.map(|_| ()),
                },
            };
            report.record(key.clone(), result);
        }
        debug!(report = %report, "restored working files");
        Ok(report)
    }

    /// Up to `limit` indexes of the chain `name` resolves to, newest first.
    /// Stops early at a root, a truncation or a missing predecessor.
    pub fn log(&self, name: &str, limit: usize) -> SyncResult<Vec<(ObjectKey, Index)>> {
        let (mut key, mut index) = self.indexes().load(name)?;
        let mut entries = Vec::new();
        while entries.len() < limit {
            let prev = index.prev;
            entries.push((key, index));
            let Parent::Index(prev) = prev else {
                break;
            };
            if !self.store().exists(&prev)? {
                break;
            }
            index = self.indexes().read_index(&prev)?;
            key = prev;
        }
        Ok(entries)
    }
}
