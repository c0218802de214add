//! Core reference types.

use std::fmt;

use edo_types::{ObjectKey, StageId};
use serde::{Deserialize, Serialize};

/// The two disjoint ref namespaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    /// `refs/<stage>`: what has been committed locally.
    Local,
    /// `refs/remote/<stage>`: what the remote was last seen to hold.
    Remote,
}

impl Namespace {
    /// Prefix used when a namespace-qualified name is displayed or parsed.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Local => "",
            Self::Remote => "remote/",
        }
    }

    /// Render a namespace-qualified ref name.
    pub fn qualify(&self, stage: &StageId) -> String {
        format!("{}{}", self.prefix(), stage)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Content of the checkout pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Checkout {
    /// A stage name, resolved through the local refs.
    Stage(StageId),
    /// An index key checked out directly.
    Detached(ObjectKey),
}

impl Checkout {
    /// Classify raw pointer text: a key is detached, anything else a stage.
    pub fn parse(text: &str) -> Result<Self, edo_types::TypeError> {
        if ObjectKey::looks_like_key(text) {
            Ok(Self::Detached(ObjectKey::from_hex(text)?))
        } else {
            Ok(Self::Stage(StageId::parse(text)?))
        }
    }

    /// Text written to the pointer file.
    pub fn render(&self) -> String {
        match self {
            Self::Stage(stage) => stage.to_string(),
            Self::Detached(key) => key.to_hex(),
        }
    }
}

/// Where the checkout pointer leads after ref resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// An existing index. `stage` is `None` for a detached checkout.
    Index {
        stage: Option<StageId>,
        key: ObjectKey,
    },
    /// A stage that is checked out but has no local ref yet.
    Unborn(StageId),
}

impl CheckoutTarget {
    pub fn key(&self) -> Option<ObjectKey> {
        match self {
            Self::Index { key, .. } => Some(*key),
            Self::Unborn(_) => None,
        }
    }

    pub fn stage(&self) -> Option<&StageId> {
        match self {
            Self::Index { stage, .. } => stage.as_ref(),
            Self::Unborn(stage) => Some(stage),
        }
    }
}
