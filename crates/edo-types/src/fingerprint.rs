use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque optimistic-concurrency token assigned by the remote repository.
///
/// The engine never interprets a fingerprint; it only compares two of them
/// for equality. Because fingerprints are stored inside comma-separated
/// index lines, they may not contain `,` or line breaks, and the literal
/// `null` is reserved for "absent".
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(token: impl Into<String>) -> Result<Self, TypeError> {
        let token = token.into();
        if token.is_empty() || token == "null" || token.contains([',', '\n', '\r']) {
            return Err(TypeError::InvalidFingerprint(token));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_opaque_tokens() {
        let fp = Fingerprint::new("A1B2C3==").unwrap();
        assert_eq!(fp.as_str(), "A1B2C3==");
    }

    #[test]
    fn rejects_reserved_and_separator_values() {
        for bad in ["", "null", "a,b", "a\nb"] {
            assert!(Fingerprint::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
