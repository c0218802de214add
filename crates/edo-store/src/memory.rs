use std::collections::HashMap;
use std::sync::RwLock;

use edo_types::ObjectKey;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are kept as raw frames so that
/// reads go through the same verification as the filesystem backend.
pub struct InMemoryObjectStore {
    frames: RwLock<HashMap<ObjectKey, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            frames: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.frames.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Return a sorted list of all keys in the store.
    pub fn all_keys(&self) -> StoreResult<Vec<ObjectKey>> {
        let map = self.frames.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut keys: Vec<ObjectKey> = map.keys().copied().collect();
        keys.sort();
        Ok(keys)
    }

    /// Overwrite the raw frame stored under `key`.
    ///
    /// Bypasses hashing entirely; only useful for simulating corruption.
    pub fn insert_raw(&self, key: ObjectKey, raw: Vec<u8>) -> StoreResult<()> {
        self.frames
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(key, raw);
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, key: &ObjectKey) -> StoreResult<Option<StoredObject>> {
        let map = self.frames.read().map_err(|_| StoreError::LockPoisoned)?;
        map.get(key)
            .map(|raw| StoredObject::from_frame(key, raw))
            .transpose()
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectKey> {
        let frame = object.frame();
        let key = ObjectKey::digest(&frame);
        let mut map = self.frames.write().map_err(|_| StoreError::LockPoisoned)?;
        map.entry(key).or_insert(frame);
        Ok(key)
    }

    fn exists(&self, key: &ObjectKey) -> StoreResult<bool> {
        let map = self.frames.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.frames.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
