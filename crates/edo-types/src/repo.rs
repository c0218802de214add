use std::path::{Path, PathBuf};

use crate::element::ElementKey;
use crate::error::TypeError;

/// Name of the metadata directory under the working root.
pub const EDO_DIR: &str = ".edo";

/// An explicit handle on a repository root.
///
/// Every operation that touches the working directory or the `.edo`
/// metadata takes a `RepoHandle` instead of relying on the process working
/// directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoHandle {
    root: PathBuf,
}

impl RepoHandle {
    /// Create a handle for `root` without checking that it is initialized.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` until a directory containing `.edo` is found.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, TypeError> {
        let start = start.as_ref();
        for dir in start.ancestors() {
            if dir.join(EDO_DIR).is_dir() {
                return Ok(Self::new(dir));
            }
        }
        Err(TypeError::RepositoryNotFound(start.to_path_buf()))
    }

    /// The working root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/.edo`
    pub fn edo_dir(&self) -> PathBuf {
        self.root.join(EDO_DIR)
    }

    /// `<root>/.edo/objects`
    pub fn objects_dir(&self) -> PathBuf {
        self.edo_dir().join("objects")
    }

    /// `<root>/.edo/config`
    pub fn config_path(&self) -> PathBuf {
        self.edo_dir().join("config")
    }

    /// Returns `true` if the metadata directory exists.
    pub fn is_initialized(&self) -> bool {
        self.edo_dir().is_dir()
    }

    /// Working directory of one element type: `<root>/<type>`.
    pub fn type_dir(&self, type_name: &str) -> PathBuf {
        self.root.join(type_name)
    }

    /// Working file of an element: `<root>/<type>/<element>`.
    pub fn element_path(&self, key: &ElementKey) -> PathBuf {
        self.type_dir(key.type_name()).join(key.element_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let repo = RepoHandle::new("/work");
        let key = ElementKey::parse("ASMPGM/FOO").unwrap();
        assert_eq!(repo.edo_dir(), PathBuf::from("/work/.edo"));
        assert_eq!(repo.objects_dir(), PathBuf::from("/work/.edo/objects"));
        assert_eq!(repo.element_path(&key), PathBuf::from("/work/ASMPGM/FOO"));
    }

    #[test]
    fn discover_walks_up_to_the_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(EDO_DIR)).unwrap();
        let nested = tmp.path().join("COBOL").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = RepoHandle::discover(&nested).unwrap();
        assert_eq!(repo.root(), tmp.path());
        assert!(repo.is_initialized());
    }

    #[test]
    fn discover_fails_outside_a_repository() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            RepoHandle::discover(tmp.path()),
            Err(TypeError::RepositoryNotFound(_))
        ));
    }
}
