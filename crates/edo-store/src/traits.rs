use edo_types::ObjectKey;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same kind and payload always
///   produce the same key, and rewriting an existing key is a no-op.
/// - `read` verifies the frame digest against the requested key before
///   returning anything.
/// - `exists` is a cheap probe and does not validate content.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read and verify an object by key.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, key: &ObjectKey) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its key.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectKey>;

    /// Check whether an object exists in the store.
    fn exists(&self, key: &ObjectKey) -> StoreResult<bool>;

    /// Store `payload` as an object of `kind` and return its key.
    fn put(&self, kind: ObjectKind, payload: &[u8]) -> StoreResult<ObjectKey> {
        self.write(&StoredObject::new(kind, payload.to_vec()))
    }

    /// Fetch the payload of `key`, optionally insisting on its kind.
    ///
    /// A missing object is [`StoreError::NotFound`]; an object of another
    /// kind is [`StoreError::KindMismatch`].
    fn get(&self, key: &ObjectKey, expected: Option<ObjectKind>) -> StoreResult<Vec<u8>> {
        let object = self.read(key)?.ok_or(StoreError::NotFound(*key))?;
        if let Some(expected) = expected {
            if object.kind != expected {
                return Err(StoreError::KindMismatch {
                    key: *key,
                    expected,
                    actual: object.kind,
                });
            }
        }
        Ok(object.data)
    }
}
