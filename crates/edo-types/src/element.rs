use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a tracked element: `TYPE/ELEMENT`.
///
/// The key doubles as the element's path relative to the working root, so
/// both halves must be single, non-empty path components. Ordering is the
/// ordering of the rendered string, which is what index encoding sorts by.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementKey {
    full: String,
    split: usize,
}

impl ElementKey {
    /// Build a key from its two halves.
    pub fn new(type_name: &str, element_name: &str) -> Result<Self, TypeError> {
        Self::parse(&format!("{type_name}/{element_name}"))
    }

    /// Parse a rendered `TYPE/ELEMENT` key.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidElementKey {
            key: s.to_string(),
            reason: reason.to_string(),
        };
        let split = s.find('/').ok_or_else(|| invalid("missing '/' separator"))?;
        let (type_name, element_name) = (&s[..split], &s[split + 1..]);
        if type_name.is_empty() || element_name.is_empty() {
            return Err(invalid("type and element name must be non-empty"));
        }
        if element_name.contains('/') || element_name.contains('\\') || type_name.contains('\\') {
            return Err(invalid("names must be single path components"));
        }
        if s.contains(['\n', '\r', '\0']) {
            return Err(invalid("contains a control character"));
        }
        if matches!(type_name, "." | "..") || matches!(element_name, "." | "..") {
            return Err(invalid("names must not be '.' or '..'"));
        }
        if type_name == crate::repo::EDO_DIR {
            return Err(invalid("type name collides with the metadata directory"));
        }
        Ok(Self {
            full: s.to_string(),
            split,
        })
    }

    /// The element type (first path component).
    pub fn type_name(&self) -> &str {
        &self.full[..self.split]
    }

    /// The element name (second path component).
    pub fn element_name(&self) -> &str {
        &self.full[self.split + 1..]
    }

    /// The rendered `TYPE/ELEMENT` string.
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl fmt::Debug for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementKey({})", self.full)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for ElementKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ElementKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ElementKey> for String {
    fn from(key: ElementKey) -> Self {
        key.full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_at_first_slash() {
        let key = ElementKey::parse("ASMPGM/FOO").unwrap();
        assert_eq!(key.type_name(), "ASMPGM");
        assert_eq!(key.element_name(), "FOO");
        assert_eq!(key.to_string(), "ASMPGM/FOO");
    }

    #[test]
    fn new_matches_parse() {
        assert_eq!(
            ElementKey::new("COBOL", "PAYROLL").unwrap(),
            ElementKey::parse("COBOL/PAYROLL").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["NOSLASH", "/FOO", "TYPE/", "A/B/C", "../X", "T/..", ".edo/X", "T/A\nB"] {
            assert!(ElementKey::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn mainframe_national_characters_are_allowed() {
        let key = ElementKey::parse("JCL/#BUILD$@").unwrap();
        assert_eq!(key.element_name(), "#BUILD$@");
    }

    #[test]
    fn ordering_follows_rendered_string() {
        let mut keys = vec![
            ElementKey::parse("AB/C").unwrap(),
            ElementKey::parse("A/#B").unwrap(),
            ElementKey::parse("A#/Z").unwrap(),
        ];
        keys.sort();
        let rendered: Vec<_> = keys.iter().map(|k| k.as_str()).collect();
        let mut expected = rendered.clone();
        expected.sort();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let key = ElementKey::parse("ASMPGM/FOO").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"ASMPGM/FOO\"");
        let back: ElementKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
