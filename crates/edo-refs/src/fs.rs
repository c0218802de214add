//! File-backed reference store over the `.edo` directory.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use edo_types::{ElementKey, ObjectKey, RepoHandle, StageId};
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::RefStore;
use crate::types::{Checkout, Namespace};

const STAGE_FILE: &str = "STAGE";
const MERGE_FILE: &str = "MERGE";
const MERGE_CONFLICT_FILE: &str = "MERGE_CONFLICT";

/// [`RefStore`] reading and writing plain pointer files.
///
/// Layout, relative to `.edo/`:
///
/// - `refs/<stage>` and `refs/remote/<stage>` hold an index key
/// - `STAGE` holds a stage name or a detached index key
/// - `MERGE` holds the remote index key of a pending merge
/// - `MERGE_CONFLICT` holds one element key per line
#[derive(Clone, Debug)]
pub struct FsRefStore {
    edo_dir: PathBuf,
}

impl FsRefStore {
    pub fn open(repo: &RepoHandle) -> Self {
        Self::at(repo.edo_dir())
    }

    pub fn at(edo_dir: impl Into<PathBuf>) -> Self {
        Self {
            edo_dir: edo_dir.into(),
        }
    }

    fn refs_dir(&self, ns: Namespace) -> PathBuf {
        match ns {
            Namespace::Local => self.edo_dir.join("refs"),
            Namespace::Remote => self.edo_dir.join("refs").join("remote"),
        }
    }

    fn ref_path(&self, ns: Namespace, stage: &StageId) -> PathBuf {
        self.refs_dir(ns).join(stage.as_str())
    }

    fn read_key_file(&self, path: &Path) -> Result<Option<ObjectKey>> {
        let Some(text) = read_optional(path)? else {
            return Ok(None);
        };
        let text = text.trim_end();
        ObjectKey::from_hex(text).map(Some).map_err(|e| RefError::CorruptState {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace a file's content via a temporary file in the same directory.
fn write_replace(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
    debug!(path = %path.display(), "wrote pointer file");
    Ok(())
}

fn remove_optional(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, ns: Namespace, stage: &StageId) -> Result<Option<ObjectKey>> {
        self.read_key_file(&self.ref_path(ns, stage))
    }

    fn write_ref(&self, ns: Namespace, stage: &StageId, key: &ObjectKey) -> Result<()> {
        write_replace(&self.ref_path(ns, stage), &key.to_hex())
    }

    fn delete_ref(&self, ns: Namespace, stage: &StageId) -> Result<bool> {
        remove_optional(&self.ref_path(ns, stage))
    }

    fn list_refs(&self, ns: Namespace) -> Result<Vec<(StageId, ObjectKey)>> {
        let dir = self.refs_dir(ns);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut refs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            // Skip temporaries left behind by an interrupted write.
            if name.starts_with('.') {
                continue;
            }
            let stage = StageId::parse(&name)?;
            if let Some(key) = self.read_key_file(&entry.path())? {
                refs.push((stage, key));
            }
        }
        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    fn checkout(&self) -> Result<Option<Checkout>> {
        let path = self.edo_dir.join(STAGE_FILE);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(RefError::CorruptState {
                file: path.display().to_string(),
                reason: "checkout pointer is empty".into(),
            });
        }
        Checkout::parse(text).map(Some).map_err(|e| RefError::CorruptState {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn set_checkout(&self, checkout: &Checkout) -> Result<()> {
        write_replace(&self.edo_dir.join(STAGE_FILE), &checkout.render())
    }

    fn merge_head(&self) -> Result<Option<ObjectKey>> {
        self.read_key_file(&self.edo_dir.join(MERGE_FILE))
    }

    fn set_merge_head(&self, key: Option<&ObjectKey>) -> Result<()> {
        let path = self.edo_dir.join(MERGE_FILE);
        match key {
            Some(key) => write_replace(&path, &key.to_hex()),
            None => remove_optional(&path).map(|_| ()),
        }
    }

    fn conflicts(&self) -> Result<Vec<ElementKey>> {
        let path = self.edo_dir.join(MERGE_CONFLICT_FILE);
        let Some(text) = read_optional(&path)? else {
            return Ok(Vec::new());
        };
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                ElementKey::parse(line).map_err(|e| RefError::CorruptState {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn set_conflicts(&self, keys: &[ElementKey]) -> Result<()> {
        let path = self.edo_dir.join(MERGE_CONFLICT_FILE);
        if keys.is_empty() {
            return remove_optional(&path).map(|_| ());
        }
        let body: Vec<&str> = keys.iter().map(ElementKey::as_str).collect();
        write_replace(&path, &body.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckoutTarget;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsRefStore) {
        let tmp = TempDir::new().unwrap();
        let store = FsRefStore::at(tmp.path().join(".edo"));
        (tmp, store)
    }

    fn stage(name: &str) -> StageId {
        StageId::parse(name).unwrap()
    }

    #[test]
    fn namespaces_are_disjoint() {
        let (_tmp, refs) = store();
        let s = stage("DEV-1-SYS-SUB");
        let local = ObjectKey::digest(b"local");
        let remote = ObjectKey::digest(b"remote");

        refs.advance(Namespace::Local, &s, &local).unwrap();
        refs.advance(Namespace::Remote, &s, &remote).unwrap();

        assert_eq!(refs.read_ref(Namespace::Local, &s).unwrap(), Some(local));
        assert_eq!(refs.read_ref(Namespace::Remote, &s).unwrap(), Some(remote));
        assert_eq!(refs.resolve("remote/DEV-1-SYS-SUB").unwrap(), Some(remote));
        assert_eq!(refs.resolve("DEV-1-SYS-SUB").unwrap(), Some(local));
    }

    #[test]
    fn ref_file_holds_raw_key() {
        let (tmp, refs) = store();
        let key = ObjectKey::digest(b"tip");
        refs.advance(Namespace::Remote, &stage("QA-2-SYS-SUB"), &key).unwrap();
        let raw = std::fs::read_to_string(tmp.path().join(".edo/refs/remote/QA-2-SYS-SUB")).unwrap();
        assert_eq!(raw, key.to_hex());
    }

    #[test]
    fn advance_rejects_reserved_stage() {
        let (_tmp, refs) = store();
        let err = refs
            .advance(Namespace::Local, &stage("remote"), &ObjectKey::digest(b"x"))
            .unwrap_err();
        assert!(matches!(err, RefError::InvalidStageName { .. }));
    }

    #[test]
    fn list_refs_skips_remote_directory() {
        let (_tmp, refs) = store();
        let key = ObjectKey::digest(b"k");
        refs.advance(Namespace::Local, &stage("B-1-S-S"), &key).unwrap();
        refs.advance(Namespace::Local, &stage("A-1-S-S"), &key).unwrap();
        refs.advance(Namespace::Remote, &stage("C-1-S-S"), &key).unwrap();

        let local: Vec<String> = refs
            .list_refs(Namespace::Local)
            .unwrap()
            .into_iter()
            .map(|(s, _)| s.to_string())
            .collect();
        assert_eq!(local, vec!["A-1-S-S", "B-1-S-S"]);
        assert_eq!(refs.list_refs(Namespace::Remote).unwrap().len(), 1);
    }

    #[test]
    fn checkout_resolution() {
        let (_tmp, refs) = store();
        assert!(refs.resolve_checkout().unwrap().is_none());

        let s = stage("DEV-1-SYS-SUB");
        refs.set_checkout(&Checkout::Stage(s.clone())).unwrap();
        assert_eq!(
            refs.resolve_checkout().unwrap(),
            Some(CheckoutTarget::Unborn(s.clone()))
        );

        let key = ObjectKey::digest(b"tip");
        refs.advance(Namespace::Local, &s, &key).unwrap();
        assert_eq!(
            refs.resolve_checkout().unwrap(),
            Some(CheckoutTarget::Index {
                stage: Some(s),
                key
            })
        );

        let detached = ObjectKey::digest(b"old");
        refs.set_checkout(&Checkout::Detached(detached)).unwrap();
        assert_eq!(
            refs.resolve_checkout().unwrap(),
            Some(CheckoutTarget::Index {
                stage: None,
                key: detached
            })
        );
    }

    #[test]
    fn empty_checkout_pointer_is_corrupted_state() {
        let (tmp, refs) = store();
        std::fs::create_dir_all(tmp.path().join(".edo")).unwrap();
        std::fs::write(tmp.path().join(".edo/STAGE"), "").unwrap();
        assert!(matches!(
            refs.checkout(),
            Err(RefError::CorruptState { .. })
        ));
    }

    #[test]
    fn merge_state_files() {
        let (tmp, refs) = store();
        let key = ObjectKey::digest(b"merge");
        refs.set_merge_head(Some(&key)).unwrap();
        assert_eq!(refs.merge_head().unwrap(), Some(key));

        let conflicts = vec![
            ElementKey::parse("COBOL/A").unwrap(),
            ElementKey::parse("COBOL/B").unwrap(),
        ];
        refs.set_conflicts(&conflicts).unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(".edo/MERGE_CONFLICT")).unwrap(),
            "COBOL/A\nCOBOL/B"
        );
        assert_eq!(refs.conflicts().unwrap(), conflicts);

        refs.set_conflicts(&[]).unwrap();
        refs.set_merge_head(None).unwrap();
        assert!(refs.conflicts().unwrap().is_empty());
        assert!(refs.merge_head().unwrap().is_none());
        assert!(!tmp.path().join(".edo/MERGE").exists());
    }
}
