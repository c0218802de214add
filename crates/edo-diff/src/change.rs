//! Change-set types shared by every diff mode.

use std::collections::BTreeMap;
use std::fmt;

use edo_types::{ElementKey, ObjectKey};
use serde::{Deserialize, Serialize};

/// One side of a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSide {
    /// The live working file; carries the key it would be stored under.
    WorkingFile(ObjectKey),
    /// A stored object.
    Object(ObjectKey),
    /// The element does not exist on this side.
    Absent,
}

impl ChangeSide {
    pub fn from_key(key: Option<ObjectKey>) -> Self {
        key.map_or(Self::Absent, Self::Object)
    }

    /// The content key behind this side, whether stored or not.
    pub fn key(&self) -> Option<ObjectKey> {
        match self {
            Self::WorkingFile(key) | Self::Object(key) => Some(*key),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for ChangeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkingFile(_) => f.write_str("working-file"),
            Self::Object(key) => write!(f, "{}", key.short_hex()),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// The kind of change between two sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Deleted => f.write_str("deleted"),
            Self::Modified => f.write_str("modified"),
        }
    }
}

/// A differing `[new, old]` pair for one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub new: ChangeSide,
    pub old: ChangeSide,
}

impl Change {
    /// Pair two sides, or `None` if they refer to the same content.
    pub fn between(new: ChangeSide, old: ChangeSide) -> Option<Self> {
        if new.key() == old.key() {
            None
        } else {
            Some(Self { new, old })
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match (self.new.is_absent(), self.old.is_absent()) {
            (false, true) => ChangeKind::Added,
            (true, false) => ChangeKind::Deleted,
            _ => ChangeKind::Modified,
        }
    }
}

/// Changes keyed by element, in key order.
pub type ChangeSet = BTreeMap<ElementKey, Change>;
