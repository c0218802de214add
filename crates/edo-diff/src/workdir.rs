//! Working directory against an index.

use std::collections::BTreeSet;
use std::io::ErrorKind;

use edo_index::{Index, TypeList};
use edo_store::blob_key;
use edo_types::{ElementKey, ObjectKey, RepoHandle};
use tracing::debug;
use walkdir::WalkDir;

use crate::change::{Change, ChangeSet, ChangeSide};
use crate::error::DiffResult;

/// Key the working file of `key` would be stored under, if it exists.
pub fn working_file_key(repo: &RepoHandle, key: &ElementKey) -> DiffResult<Option<ObjectKey>> {
    match std::fs::read(repo.element_path(key)) {
        Ok(content) => Ok(Some(blob_key(&content))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Element files physically present under the directories of `types`.
fn scan_type_dirs(repo: &RepoHandle, types: &TypeList) -> DiffResult<BTreeSet<ElementKey>> {
    let mut found = BTreeSet::new();
    for type_name in types.names() {
        let dir = repo.type_dir(type_name);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            match ElementKey::new(type_name, &name) {
                Ok(key) => {
                    found.insert(key);
                }
                Err(e) => debug!(error = %e, "skipping unaddressable working file"),
            }
        }
    }
    Ok(found)
}

/// Compare live working files against `index`.
///
/// Candidates are the files under each type directory named by `types`
/// plus every element of the index. Each live file is hashed as a blob and
/// compared with the element's current version, or with its base version
/// when `base` is set.
pub fn diff_workdir(
    repo: &RepoHandle,
    types: &TypeList,
    index: &Index,
    base: bool,
) -> DiffResult<ChangeSet> {
    let mut candidates = scan_type_dirs(repo, types)?;
    candidates.extend(index.elements.keys().cloned());

    let mut changes = ChangeSet::new();
    for key in candidates {
        let old = index
            .get(&key)
            .and_then(|rec| if base { rec.base } else { rec.current() });
        let new = match working_file_key(repo, &key)? {
            Some(hash) => ChangeSide::WorkingFile(hash),
            None => ChangeSide::Absent,
        };
        if let Some(change) = Change::between(new, ChangeSide::from_key(old)) {
            changes.insert(key, change);
        }
    }
    debug!(stage = %index.stage, changes = changes.len(), "diffed working directory");
    Ok(changes)
}
