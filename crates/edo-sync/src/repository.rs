use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use edo_index::{Index, IndexManager};
use edo_merge::MergeOptions;
use edo_refs::{CheckoutTarget, FsRefStore, RefStore};
use edo_store::{FsObjectStore, ObjectKind, ObjectStore};
use edo_types::{ElementKey, ObjectKey, RepoHandle};
use tracing::{debug, info};

use crate::config::RepoConfig;
use crate::error::{SyncError, SyncResult};

/// An opened repository: its root, settings, and stores.
///
/// Workflows are implemented as methods in the sibling modules.
#[derive(Clone)]
pub struct Repository {
    handle: RepoHandle,
    config: RepoConfig,
    indexes: IndexManager,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.handle.root())
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Create the metadata layout under `root` and save `config`.
    pub fn init(root: impl AsRef<Path>, config: RepoConfig) -> SyncResult<Self> {
        let handle = RepoHandle::new(root.as_ref());
        if handle.is_initialized() {
            return Err(SyncError::AlreadyInitialized(handle.edo_dir()));
        }
        std::fs::create_dir_all(handle.objects_dir())?;
        std::fs::create_dir_all(handle.edo_dir().join("refs").join("remote"))?;
        config.save(&handle)?;
        info!(root = %handle.root().display(), "initialized repository");
        Ok(Self::on_disk(handle, config))
    }

    /// Open the repository rooted exactly at `root`.
    pub fn open(root: impl AsRef<Path>) -> SyncResult<Self> {
        let handle = RepoHandle::new(root.as_ref());
        if !handle.is_initialized() {
            return Err(edo_types::TypeError::RepositoryNotFound(handle.root().to_path_buf()).into());
        }
        let config = RepoConfig::load(&handle)?;
        Ok(Self::on_disk(handle, config))
    }

    /// Open the repository containing `start`.
    pub fn discover(start: impl AsRef<Path>) -> SyncResult<Self> {
        let handle = RepoHandle::discover(start)?;
        let config = RepoConfig::load(&handle)?;
        Ok(Self::on_disk(handle, config))
    }

    fn on_disk(handle: RepoHandle, config: RepoConfig) -> Self {
        let store = Arc::new(FsObjectStore::open(&handle));
        let refs = Arc::new(FsRefStore::open(&handle));
        Self::with_stores(handle, config, store, refs)
    }

    /// Assemble a repository over arbitrary stores. The working directory
    /// still lives under `handle`.
    pub fn with_stores(
        handle: RepoHandle,
        config: RepoConfig,
        store: Arc<dyn ObjectStore>,
        refs: Arc<dyn RefStore>,
    ) -> Self {
        Self {
            handle,
            config,
            indexes: IndexManager::new(store, refs),
        }
    }

    pub fn handle(&self) -> &RepoHandle {
        &self.handle
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.indexes.store().as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.indexes.refs().as_ref()
    }

    /// Merge behavior derived from the configuration.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::default().trimmed(self.config.trim_trailing_whitespace)
    }

    /// The index the checkout pointer leads to, if any.
    pub fn checked_out(&self) -> SyncResult<Option<(CheckoutTarget, Option<Index>)>> {
        let Some(target) = self.refs().resolve_checkout()? else {
            return Ok(None);
        };
        let index = match target.key() {
            Some(key) => Some(self.indexes.read_index(&key)?),
            None => None,
        };
        Ok(Some((target, index)))
    }

    // ---------------------------------------------------------------
    // Working files
    // ---------------------------------------------------------------

    pub async fn read_working(&self, key: &ElementKey) -> SyncResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.handle.element_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write_working(&self, key: &ElementKey, content: &[u8]) -> SyncResult<()> {
        let path = self.handle.element_path(key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, content).await?;
        debug!(element = %key, bytes = content.len(), "wrote working file");
        Ok(())
    }

    /// Remove a working file. Returns `false` if it did not exist.
    pub async fn remove_working(&self, key: &ElementKey) -> SyncResult<bool> {
        match tokio::fs::remove_file(self.handle.element_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the stored version `object` of `key` to the working directory.
    pub async fn materialize(&self, key: &ElementKey, object: &ObjectKey) -> SyncResult<()> {
        let content = self.store().get(object, Some(ObjectKind::Blob))?;
        self.write_working(key, &content).await
    }

    /// Write the current version of every element of `index`. Elements
    /// without content are skipped. Returns the number of files written.
    pub async fn materialize_index(&self, index: &Index) -> SyncResult<usize> {
        let mut written = 0;
        for (key, record) in &index.elements {
            if let Some(object) = record.current() {
                self.materialize(key, &object).await?;
                written += 1;
            }
        }
        Ok(written)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use edo_index::{ElementRecord, IndexStatus};
    use edo_types::StageId;
    use tempfile::TempDir;

    #[test]
    fn init_creates_layout_and_refuses_twice() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path(), RepoConfig::new("https://host/rest/")).unwrap();
        assert!(repo.handle().objects_dir().is_dir());
        assert!(repo.handle().edo_dir().join("refs/remote").is_dir());
        assert!(repo.handle().config_path().is_file());
        assert!(matches!(
            Repository::init(tmp.path(), RepoConfig::default()),
            Err(SyncError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn open_and_discover() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path(), RepoConfig::new("https://host/rest/")).unwrap();
        let nested = tmp.path().join("COBOL");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(repo.handle().root(), tmp.path());
        assert_eq!(repo.config().repo_url, "https://host/rest/");
        assert!(Repository::open(&nested).is_err());
    }

    #[tokio::test]
    async fn working_file_helpers() {
        let (_tmp, repo) = fixtures::repo();
        let key = ElementKey::parse("COBOL/PAY01").unwrap();
        assert_eq!(repo.read_working(&key).await.unwrap(), None);
        repo.write_working(&key, b"DATA").await.unwrap();
        assert_eq!(repo.read_working(&key).await.unwrap().unwrap(), b"DATA");
        assert!(repo.remove_working(&key).await.unwrap());
        assert!(!repo.remove_working(&key).await.unwrap());
    }

    #[tokio::test]
    async fn materialize_skips_elements_without_content() {
        let (_tmp, repo) = fixtures::repo();
        let object = repo.store().put(ObjectKind::Blob, b"HELLO\n").unwrap();
        let mut index = Index::new(StageId::parse("DEV-1-SYS-SUB").unwrap(), IndexStatus::Pull);
        let pulled = ElementKey::parse("ASMPGM/FOO").unwrap();
        let fetched = ElementKey::parse("ASMPGM/BAR").unwrap();
        index.elements.insert(pulled.clone(), ElementRecord::synced(object, None));
        index.elements.insert(fetched.clone(), ElementRecord::default());

        assert_eq!(repo.materialize_index(&index).await.unwrap(), 1);
        assert_eq!(repo.read_working(&pulled).await.unwrap().unwrap(), b"HELLO\n");
        assert!(repo.read_working(&fetched).await.unwrap().is_none());
    }
}
