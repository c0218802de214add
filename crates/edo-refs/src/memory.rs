//! In-memory reference store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use edo_types::{ElementKey, ObjectKey, StageId};

use crate::error::{RefError, Result};
use crate::traits::RefStore;
use crate::types::{Checkout, Namespace};

#[derive(Debug, Default)]
struct State {
    refs: BTreeMap<(Namespace, StageId), ObjectKey>,
    checkout: Option<Checkout>,
    merge_head: Option<ObjectKey>,
    conflicts: Vec<ElementKey>,
}

/// An in-memory implementation of [`RefStore`].
///
/// All data lives behind a single `RwLock`. Data is lost when the store is
/// dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    state: RwLock<State>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| RefError::LockPoisoned)
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| RefError::LockPoisoned)
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, ns: Namespace, stage: &StageId) -> Result<Option<ObjectKey>> {
        Ok(self.read_state()?.refs.get(&(ns, stage.clone())).copied())
    }

    fn write_ref(&self, ns: Namespace, stage: &StageId, key: &ObjectKey) -> Result<()> {
        self.write_state()?.refs.insert((ns, stage.clone()), *key);
        Ok(())
    }

    fn delete_ref(&self, ns: Namespace, stage: &StageId) -> Result<bool> {
        Ok(self.write_state()?.refs.remove(&(ns, stage.clone())).is_some())
    }

    fn list_refs(&self, ns: Namespace) -> Result<Vec<(StageId, ObjectKey)>> {
        Ok(self
            .read_state()?
            .refs
            .iter()
            .filter(|((n, _), _)| *n == ns)
            .map(|((_, stage), key)| (stage.clone(), *key))
            .collect())
    }

    fn checkout(&self) -> Result<Option<Checkout>> {
        Ok(self.read_state()?.checkout.clone())
    }

    fn set_checkout(&self, checkout: &Checkout) -> Result<()> {
        self.write_state()?.checkout = Some(checkout.clone());
        Ok(())
    }

    fn merge_head(&self) -> Result<Option<ObjectKey>> {
        Ok(self.read_state()?.merge_head)
    }

    fn set_merge_head(&self, key: Option<&ObjectKey>) -> Result<()> {
        self.write_state()?.merge_head = key.copied();
        Ok(())
    }

    fn conflicts(&self) -> Result<Vec<ElementKey>> {
        Ok(self.read_state()?.conflicts.clone())
    }

    fn set_conflicts(&self, keys: &[ElementKey]) -> Result<()> {
        self.write_state()?.conflicts = keys.to_vec();
        Ok(())
    }
}
