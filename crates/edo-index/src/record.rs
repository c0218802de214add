//! Per-element record stored in an index.

use edo_types::{Fingerprint, ObjectKey};
use serde::{Deserialize, Serialize};

/// What an index knows about one element.
///
/// `base` is the version last obtained from the remote (the merge
/// ancestor); `local` is the version last committed locally. Either may be
/// absent: a freshly fetched element has neither until it is pulled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub local: Option<ObjectKey>,
    pub base: Option<ObjectKey>,
    pub fingerprint: Option<Fingerprint>,
    pub history: Option<ObjectKey>,
}

impl ElementRecord {
    /// A record whose local and base versions are both `key`.
    pub fn synced(key: ObjectKey, fingerprint: Option<Fingerprint>) -> Self {
        Self {
            local: Some(key),
            base: Some(key),
            fingerprint,
            history: None,
        }
    }

    /// The version that represents this element: `local` if set, else `base`.
    pub fn current(&self) -> Option<ObjectKey> {
        self.local.or(self.base)
    }

    /// Returns `true` if a local commit diverges from the remote base.
    pub fn is_locally_modified(&self) -> bool {
        matches!((self.local, self.base), (Some(l), Some(b)) if l != b)
    }
}
