//! Unified text patches for a single element.

use std::borrow::Cow;
use std::io::ErrorKind;

use edo_store::ObjectStore;
use edo_types::text::trim_lines;
use edo_types::{ElementKey, RepoHandle};
use similar::TextDiff;

use crate::change::{Change, ChangeSide};
use crate::error::DiffResult;

/// Unified patch from `old` to `new`, labelled `a/<key>` and `b/<key>`.
///
/// With `normalize_whitespace`, trailing whitespace is ignored on both
/// sides. Identical inputs produce no lines at all.
pub fn text_diff(key: &ElementKey, new: &str, old: &str, normalize_whitespace: bool) -> Vec<String> {
    let (new, old): (Cow<'_, str>, Cow<'_, str>) = if normalize_whitespace {
        (Cow::Owned(trim_lines(new)), Cow::Owned(trim_lines(old)))
    } else {
        (Cow::Borrowed(new), Cow::Borrowed(old))
    };
    if new == old {
        return Vec::new();
    }

    let diff = TextDiff::from_lines(old.as_ref(), new.as_ref());
    let patch = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{key}"), &format!("b/{key}"))
        .to_string();
    patch.lines().map(str::to_string).collect()
}

/// Content behind one side of a change. `Absent` yields `None`.
pub fn load_side(
    store: &dyn ObjectStore,
    repo: &RepoHandle,
    key: &ElementKey,
    side: &ChangeSide,
) -> DiffResult<Option<Vec<u8>>> {
    match side {
        ChangeSide::Absent => Ok(None),
        ChangeSide::Object(object) => Ok(Some(store.get(object, None)?)),
        ChangeSide::WorkingFile(_) => match std::fs::read(repo.element_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        },
    }
}

/// Load both sides of `change` and render the patch between them.
pub fn patch_for_change(
    store: &dyn ObjectStore,
    repo: &RepoHandle,
    key: &ElementKey,
    change: &Change,
    normalize_whitespace: bool,
) -> DiffResult<Vec<String>> {
    let new = load_side(store, repo, key, &change.new)?.unwrap_or_default();
    let old = load_side(store, repo, key, &change.old)?.unwrap_or_default();
    Ok(text_diff(
        key,
        &String::from_utf8_lossy(&new),
        &String::from_utf8_lossy(&old),
        normalize_whitespace,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use edo_store::{blob_key, InMemoryObjectStore, ObjectKind};
    use tempfile::TempDir;

    fn key() -> ElementKey {
        ElementKey::parse("ASMPGM/FOO").unwrap()
    }

    #[test]
    fn identical_text_has_no_patch() {
        assert!(text_diff(&key(), "A\nB\n", "A\nB\n", false).is_empty());
    }

    #[test]
    fn trailing_whitespace_is_ignored_when_normalizing() {
        assert!(text_diff(&key(), "A  \nB\t\n", "A\nB\n", true).is_empty());
        assert!(!text_diff(&key(), "A  \nB\t\n", "A\nB\n", false).is_empty());
        assert!(text_diff(&key(), "A \r\nB\r\n", "A\nB\n", true).is_empty());
    }

    #[test]
    fn patch_has_labels_and_changes() {
        let lines = text_diff(&key(), "WORLD\n", "HELLO\n", false);
        assert_eq!(lines[0], "--- a/ASMPGM/FOO");
        assert_eq!(lines[1], "+++ b/ASMPGM/FOO");
        assert!(lines.iter().any(|l| l.starts_with("@@")));
        assert!(lines.contains(&"-HELLO".to_string()));
        assert!(lines.contains(&"+WORLD".to_string()));
    }

    #[test]
    fn patch_for_working_file_change() {
        let tmp = TempDir::new().unwrap();
        let repo = RepoHandle::new(tmp.path());
        let store = InMemoryObjectStore::new();
        let hello = store.put(ObjectKind::Blob, b"HELLO\n").unwrap();
        std::fs::create_dir_all(tmp.path().join("ASMPGM")).unwrap();
        std::fs::write(repo.element_path(&key()), b"WORLD\n").unwrap();

        let change = Change {
            new: ChangeSide::WorkingFile(blob_key(b"WORLD\n")),
            old: ChangeSide::Object(hello),
        };
        let lines = patch_for_change(&store, &repo, &key(), &change, true).unwrap();
        assert!(lines.contains(&"-HELLO".to_string()));
        assert!(lines.contains(&"+WORLD".to_string()));
    }

    #[test]
    fn deleted_side_diffs_against_empty() {
        let tmp = TempDir::new().unwrap();
        let repo = RepoHandle::new(tmp.path());
        let store = InMemoryObjectStore::new();
        let hello = store.put(ObjectKind::Blob, b"HELLO\n").unwrap();
        let change = Change {
            new: ChangeSide::Absent,
            old: ChangeSide::Object(hello),
        };
        let lines = patch_for_change(&store, &repo, &key(), &change, false).unwrap();
        assert!(lines.contains(&"-HELLO".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with('+') && !l.starts_with("+++")));
    }
}
