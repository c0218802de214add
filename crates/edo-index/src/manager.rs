//! Loading, storing and navigating indexes through the ref stores.

use std::sync::Arc;

use edo_refs::{Namespace, RefStore};
use edo_store::{ObjectKind, ObjectStore};
use edo_types::{ObjectKey, StageId};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::history::History;
use crate::index::{Index, Parent};
use crate::type_list::TypeList;

/// Index operations over an object store and a ref store.
#[derive(Clone)]
pub struct IndexManager {
    store: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager").finish_non_exhaustive()
    }
}

impl IndexManager {
    pub fn new(store: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self { store, refs }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn refs(&self) -> &Arc<dyn RefStore> {
        &self.refs
    }

    // ---------------------------------------------------------------
    // Objects
    // ---------------------------------------------------------------

    /// Encode and store an index, returning its key.
    pub fn store_index(&self, index: &Index) -> IndexResult<ObjectKey> {
        let key = self.store.put(ObjectKind::List, index.encode().as_bytes())?;
        debug!(key = %key.short_hex(), stage = %index.stage, elements = index.len(), "stored index");
        Ok(key)
    }

    /// Load and decode the index stored under `key`.
    pub fn read_index(&self, key: &ObjectKey) -> IndexResult<Index> {
        let bytes = self.store.get(key, Some(ObjectKind::List))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| IndexError::malformed("index", 0, "not valid UTF-8"))?;
        Index::decode(&text)
    }

    pub fn store_type_list(&self, list: &TypeList) -> IndexResult<ObjectKey> {
        Ok(self.store.put(ObjectKind::Type, list.encode().as_bytes())?)
    }

    /// The type list an index refers to, or an empty list if it has none.
    pub fn read_type_list(&self, index: &Index) -> IndexResult<TypeList> {
        let Some(key) = index.type_list else {
            return Ok(TypeList::new());
        };
        let bytes = self.store.get(&key, Some(ObjectKind::Type))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| IndexError::malformed("type list", 0, "not valid UTF-8"))?;
        TypeList::decode(&text)
    }

    pub fn store_history(&self, listing: &str) -> IndexResult<ObjectKey> {
        Ok(self.store.put(ObjectKind::Logs, listing.as_bytes())?)
    }

    pub fn read_history(&self, key: &ObjectKey) -> IndexResult<History> {
        let bytes = self.store.get(key, Some(ObjectKind::Logs))?;
        Ok(History::parse(&String::from_utf8_lossy(&bytes)))
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    /// Resolve a stage name, `remote/`-qualified stage name or index key.
    ///
    /// A key-shaped name that exists in the store is taken as a key;
    /// anything else goes through the refs.
    pub fn resolve(&self, name: &str) -> IndexResult<ObjectKey> {
        if ObjectKey::looks_like_key(name) {
            if let Ok(key) = ObjectKey::from_hex(name) {
                if self.store.exists(&key)? {
                    return Ok(key);
                }
            }
        }
        self.refs
            .resolve(name)?
            .ok_or_else(|| IndexError::ReferenceNotFound(name.to_string()))
    }

    /// Resolve `name` and load the index it points at.
    pub fn load(&self, name: &str) -> IndexResult<(ObjectKey, Index)> {
        let key = self.resolve(name)?;
        Ok((key, self.read_index(&key)?))
    }

    /// Load the tip of a stage ref, if the ref exists.
    pub fn load_stage(
        &self,
        ns: Namespace,
        stage: &StageId,
    ) -> IndexResult<Option<(ObjectKey, Index)>> {
        match self.refs.read_ref(ns, stage)? {
            Some(key) => Ok(Some((key, self.read_index(&key)?))),
            None => Ok(None),
        }
    }

    /// Store `index` and advance the stage ref to it.
    pub fn commit_index(&self, ns: Namespace, index: &Index) -> IndexResult<ObjectKey> {
        let key = self.store_index(index)?;
        self.refs.advance(ns, &index.stage, &key)?;
        Ok(key)
    }

    // ---------------------------------------------------------------
    // History navigation
    // ---------------------------------------------------------------

    /// Follow `prev` exactly `n` times from the index `name` resolves to.
    ///
    /// If the predecessor at the target depth is missing from the store,
    /// the index one level short is returned with its `prev` rewritten to
    /// [`Parent::Truncated`]. A chain that ends before depth `n` is an
    /// error.
    pub fn walk_back(&self, name: &str, n: usize) -> IndexResult<Index> {
        let (_, mut index) = self.load(name)?;
        for depth in 1..=n {
            let prev = match index.prev {
                Parent::Index(prev) => prev,
                Parent::Root | Parent::Truncated => {
                    return Err(IndexError::HistoryExhausted {
                        name: name.to_string(),
                        requested: n,
                        available: depth - 1,
                    })
                }
            };
            if depth == n && !self.store.exists(&prev)? {
                debug!(target_name = name, depth, "history truncated at target depth");
                index.prev = Parent::Truncated;
                return Ok(index);
            }
            index = self.read_index(&prev)?;
        }
        Ok(index)
    }
}
