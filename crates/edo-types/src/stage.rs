use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A stage coordinate: `ENV-N-SYSTEM-SUBSYSTEM`.
///
/// Stages name both the remote location an index was fetched from and the
/// local ref that tracks it. The identifier is kept as written; the four
/// components are available through [`StageId::components`] when the name
/// follows the usual layout.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageId(String);

/// The four coordinates of a conventionally named stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageComponents<'a> {
    pub environment: &'a str,
    pub stage_number: &'a str,
    pub system: &'a str,
    pub subsystem: &'a str,
}

impl StageId {
    /// Parse a stage identifier.
    ///
    /// The identifier must be non-empty and free of path separators and
    /// whitespace, since it is used verbatim as a ref file name.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidStage {
            stage: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if s.contains(['/', '\\']) {
            return Err(invalid("must not contain path separators"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("must not contain whitespace"));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into environment, stage number, system and subsystem.
    ///
    /// Returns `None` unless the name has exactly four `-`-separated parts.
    pub fn components(&self) -> Option<StageComponents<'_>> {
        let mut parts = self.0.split('-');
        let components = StageComponents {
            environment: parts.next()?,
            stage_number: parts.next()?,
            system: parts.next()?,
            subsystem: parts.next()?,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(components)
    }
}

impl fmt::Debug for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageId({})", self.0)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StageId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StageId> for String {
    fn from(stage: StageId) -> Self {
        stage.0
    }
}
