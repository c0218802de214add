//! Index against index, self-diff and the fingerprint gate.

use std::collections::BTreeSet;

use edo_index::Index;
use edo_types::ElementKey;

use crate::change::{Change, ChangeSet, ChangeSide};

/// Compare the current versions of two indexes.
///
/// With `base`, the old side contributes its base version instead, which
/// answers "what changed relative to what was last synchronized".
pub fn diff_indexes(new: &Index, old: &Index, base: bool) -> ChangeSet {
    let keys: BTreeSet<&ElementKey> = new.elements.keys().chain(old.elements.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let new_side = new.get(key).and_then(|rec| rec.current());
            let old_side = old
                .get(key)
                .and_then(|rec| if base { rec.base } else { rec.current() });
            Change::between(ChangeSide::from_key(new_side), ChangeSide::from_key(old_side))
                .map(|change| (key.clone(), change))
        })
        .collect()
}

/// Local commits that have not been reconciled with the remote base.
///
/// An element without a local version is represented by its base and so
/// never shows up here.
pub fn diff_self(index: &Index) -> ChangeSet {
    index
        .elements
        .iter()
        .filter_map(|(key, rec)| {
            Change::between(
                ChangeSide::from_key(rec.current()),
                ChangeSide::from_key(rec.base),
            )
            .map(|change| (key.clone(), change))
        })
        .collect()
}

/// Elements present in both indexes whose fingerprints differ.
///
/// A non-empty result means the remote moved since the local index last
/// saw it, and pushing must wait for a pull.
pub fn fingerprint_diff(local: &Index, remote: &Index) -> Vec<ElementKey> {
    local
        .elements
        .iter()
        .filter_map(|(key, rec)| {
            let other = remote.get(key)?;
            (other.fingerprint != rec.fingerprint).then(|| key.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeKind;
    use edo_index::{ElementRecord, IndexStatus};
    use edo_types::{Fingerprint, ObjectKey, StageId};

    fn key(s: &str) -> ElementKey {
        ElementKey::parse(s).unwrap()
    }

    fn index(elems: &[(&str, ElementRecord)]) -> Index {
        let mut index = Index::new(StageId::parse("DEV-1-SYS-SUB").unwrap(), IndexStatus::Fetch);
        for (k, rec) in elems {
            index.elements.insert(key(k), rec.clone());
        }
        index
    }

    fn synced(content: &[u8], fp: &str) -> ElementRecord {
        ElementRecord::synced(ObjectKey::digest(content), Some(Fingerprint::new(fp).unwrap()))
    }

    #[test]
    fn identical_indexes_have_no_changes() {
        let a = index(&[("T/A", synced(b"a", "1"))]);
        assert!(diff_indexes(&a, &a, false).is_empty());
        assert!(diff_self(&a).is_empty());
        assert!(fingerprint_diff(&a, &a).is_empty());
    }

    #[test]
    fn union_of_keys() {
        let new = index(&[("T/A", synced(b"a2", "1")), ("T/NEW", synced(b"n", "1"))]);
        let old = index(&[("T/A", synced(b"a", "1")), ("T/GONE", synced(b"g", "1"))]);
        let changes = diff_indexes(&new, &old, false);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[&key("T/A")].kind(), ChangeKind::Modified);
        assert_eq!(changes[&key("T/NEW")].kind(), ChangeKind::Added);
        assert_eq!(changes[&key("T/GONE")].kind(), ChangeKind::Deleted);
    }

    #[test]
    fn base_flag_uses_old_base() {
        let mut rec = synced(b"base", "1");
        rec.local = Some(ObjectKey::digest(b"local"));
        let old = index(&[("T/A", rec.clone())]);
        let new = index(&[("T/A", rec)]);
        assert!(diff_indexes(&new, &old, false).is_empty());
        let changes = diff_indexes(&new, &old, true);
        assert_eq!(
            changes[&key("T/A")].old,
            ChangeSide::Object(ObjectKey::digest(b"base"))
        );
    }

    #[test]
    fn self_diff_reports_local_commits() {
        let mut modified = synced(b"base", "1");
        modified.local = Some(ObjectKey::digest(b"local"));
        let unpulled = ElementRecord::default();
        let index = index(&[("T/A", modified), ("T/B", synced(b"b", "1")), ("T/C", unpulled)]);
        let changes = diff_self(&index);
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec![&key("T/A")]);
    }

    #[test]
    fn fingerprint_gate_considers_common_keys_only() {
        let local = index(&[
            ("T/A", synced(b"a", "1")),
            ("T/B", synced(b"b", "1")),
            ("T/LOCAL", synced(b"l", "1")),
        ]);
        let remote = index(&[
            ("T/A", synced(b"a", "1")),
            ("T/B", synced(b"b", "2")),
            ("T/REMOTE", synced(b"r", "9")),
        ]);
        assert_eq!(fingerprint_diff(&local, &remote), vec![key("T/B")]);
    }

    #[test]
    fn cleared_remote_fingerprint_counts_as_moved() {
        let local = index(&[("T/A", synced(b"a", "1"))]);
        let mut remote = local.clone();
        remote.elements.get_mut(&key("T/A")).unwrap().fingerprint = None;
        assert_eq!(fingerprint_diff(&local, &remote), vec![key("T/A")]);
    }
}
