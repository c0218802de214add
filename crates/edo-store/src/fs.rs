use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use edo_types::{ObjectKey, RepoHandle};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Loose-file object store rooted at `.edo/objects`.
///
/// Each object lives at `objects/<key[0:2]>/<key[2:]>`. Files are written to
/// a temporary file in the shard directory and renamed into place, so a
/// reader never observes a partially written frame.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    objects_dir: PathBuf,
}

impl FsObjectStore {
    /// Open the store of a repository.
    pub fn open(repo: &RepoHandle) -> Self {
        Self::at(repo.objects_dir())
    }

    /// Open a store rooted at an arbitrary directory.
    pub fn at(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Path of the file holding `key`.
    pub fn object_path(&self, key: &ObjectKey) -> PathBuf {
        self.objects_dir.join(key.shard()).join(key.file_name())
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, key: &ObjectKey) -> StoreResult<Option<StoredObject>> {
        let path = self.object_path(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!(key = %key.short_hex(), bytes = raw.len(), "read object");
        StoredObject::from_frame(key, &raw).map(Some)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectKey> {
        let frame = object.frame();
        let key = ObjectKey::digest(&frame);
        let path = self.object_path(&key);
        if path.exists() {
            return Ok(key);
        }

        let shard = self.objects_dir.join(key.shard());
        std::fs::create_dir_all(&shard)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&shard)?;
        tmp.write_all(&frame)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .map_err(|e| StoreError::Io(e.error))?;
        debug!(key = %key.short_hex(), kind = %object.kind, "wrote object");
        Ok(key)
    }

    fn exists(&self, key: &ObjectKey) -> StoreResult<bool> {
        Ok(self.object_path(key).is_file())
    }
}
