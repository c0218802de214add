use serde::{Deserialize, Serialize};

/// Outcome of merging one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStatus {
    /// The result combines both sides without conflict.
    Merged,
    /// The result contains at least one conflict marker block.
    Conflict,
    /// The local version already includes the remote change.
    UpToDate,
    /// The element no longer exists on the remote.
    Deleted,
}

impl MergeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::Conflict => "conflict",
            Self::UpToDate => "up-to-date",
            Self::Deleted => "deleted",
        }
    }

    pub fn is_conflict(self) -> bool {
        self == Self::Conflict
    }
}

impl std::fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
