//! The [`Index`] snapshot record and its line codec.
//!
//! ```text
//! prev <key|none|truncated>
//! stage <stage>
//! status <status>
//! message <message>
//! type <key|null>
//! elem <local|lsha1>,<base|rsha1>,<fingerprint|null>,<history|null>,<TYPE/ELEMENT>
//! ```
//!
//! Element lines are ordered by key and there is no trailing newline, so a
//! decoded index re-encodes to the same bytes and therefore the same key.

use std::collections::BTreeMap;
use std::fmt;

use edo_types::{ElementKey, Fingerprint, ObjectKey, StageId};

use crate::error::{IndexError, IndexResult};
use crate::record::ElementRecord;

const NO_LOCAL: &str = "lsha1";
const NO_BASE: &str = "rsha1";
const NULL: &str = "null";

/// Link from an index to its predecessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
    /// First index of its chain.
    Root,
    /// The predecessor exists but is not available locally.
    Truncated,
    /// Key of the predecessor index.
    Index(ObjectKey),
}

impl Parent {
    pub fn key(&self) -> Option<ObjectKey> {
        match self {
            Self::Index(key) => Some(*key),
            _ => None,
        }
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("none"),
            Self::Truncated => f.write_str("truncated"),
            Self::Index(key) => write!(f, "{key}"),
        }
    }
}

/// Which operation produced an index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexStatus {
    Fetch,
    Pull,
    Merge,
    Commit,
    Push,
    /// Any other single-word status written by a newer or older tool.
    Other(String),
}

impl IndexStatus {
    fn parse(s: &str) -> Self {
        match s {
            "fetch" => Self::Fetch,
            "pull" => Self::Pull,
            "merge" => Self::Merge,
            "commit" => Self::Commit,
            "push" => Self::Push,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Pull => f.write_str("pull"),
            Self::Merge => f.write_str("merge"),
            Self::Commit => f.write_str("commit"),
            Self::Push => f.write_str("push"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Immutable snapshot of one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    pub prev: Parent,
    pub stage: StageId,
    pub status: IndexStatus,
    pub message: String,
    pub type_list: Option<ObjectKey>,
    pub elements: BTreeMap<ElementKey, ElementRecord>,
}

impl Index {
    /// Create an empty root index for `stage`.
    pub fn new(stage: StageId, status: IndexStatus) -> Self {
        Self {
            prev: Parent::Root,
            stage,
            status,
            message: String::new(),
            type_list: None,
            elements: BTreeMap::new(),
        }
    }

    /// A copy of this index chained onto it as the next snapshot.
    ///
    /// `self_key` must be the key this index is stored under.
    pub fn successor(&self, self_key: ObjectKey, status: IndexStatus, message: &str) -> Self {
        Self {
            prev: Parent::Index(self_key),
            stage: self.stage.clone(),
            status,
            message: message.to_string(),
            type_list: self.type_list,
            elements: self.elements.clone(),
        }
    }

    pub fn get(&self, key: &ElementKey) -> Option<&ElementRecord> {
        self.elements.get(key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render the canonical text form.
    ///
    /// Line breaks in the message are flattened to spaces so the record
    /// stays line-oriented.
    pub fn encode(&self) -> String {
        let mut lines = Vec::with_capacity(5 + self.elements.len());
        lines.push(format!("prev {}", self.prev));
        lines.push(format!("stage {}", self.stage));
        lines.push(format!("status {}", single_line(&self.status.to_string())));
        lines.push(format!("message {}", single_line(&self.message)));
        lines.push(format!(
            "type {}",
            self.type_list.map_or_else(|| NULL.to_string(), |k| k.to_hex())
        ));
        for (key, rec) in &self.elements {
            lines.push(format!(
                "elem {},{},{},{},{}",
                rec.local.map_or_else(|| NO_LOCAL.to_string(), |k| k.to_hex()),
                rec.base.map_or_else(|| NO_BASE.to_string(), |k| k.to_hex()),
                rec.fingerprint.as_ref().map_or(NULL, Fingerprint::as_str),
                rec.history.map_or_else(|| NULL.to_string(), |k| k.to_hex()),
                key,
            ));
        }
        lines.join("\n")
    }

    /// Parse the text form produced by [`Index::encode`].
    ///
    /// Header lines may appear in any order but each exactly once; any line
    /// that is neither a header nor an `elem` line is rejected.
    pub fn decode(text: &str) -> IndexResult<Self> {
        let mut prev = None;
        let mut stage = None;
        let mut status = None;
        let mut message = None;
        let mut type_list = None;
        let mut elements = BTreeMap::new();

        for (i, line) in text.split('\n').enumerate() {
            let n = i + 1;
            let (tag, value) = line.split_once(' ').unwrap_or((line, ""));
            match tag {
                "prev" => set_once(&mut prev, n, "prev", parse_parent(value, n)?)?,
                "stage" => {
                    let s = StageId::parse(value)
                        .map_err(|e| IndexError::malformed("index", n, e.to_string()))?;
                    set_once(&mut stage, n, "stage", s)?;
                }
                "status" => set_once(&mut status, n, "status", IndexStatus::parse(value))?,
                "message" => set_once(&mut message, n, "message", value.to_string())?,
                "type" => set_once(
                    &mut type_list,
                    n,
                    "type",
                    parse_optional_key(value, &[NULL], n)?,
                )?,
                "elem" => {
                    let (key, rec) = parse_elem(value, n)?;
                    if elements.insert(key.clone(), rec).is_some() {
                        return Err(IndexError::malformed(
                            "index",
                            n,
                            format!("duplicate element {key}"),
                        ));
                    }
                }
                _ => {
                    return Err(IndexError::malformed(
                        "index",
                        n,
                        format!("unknown line {line:?}"),
                    ))
                }
            }
        }

        let missing = |field: &str| IndexError::malformed("index", 0, format!("missing {field} line"));
        Ok(Self {
            prev: prev.ok_or_else(|| missing("prev"))?,
            stage: stage.ok_or_else(|| missing("stage"))?,
            status: status.ok_or_else(|| missing("status"))?,
            message: message.ok_or_else(|| missing("message"))?,
            type_list: type_list.ok_or_else(|| missing("type"))?,
            elements,
        })
    }
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn set_once<T>(slot: &mut Option<T>, line: usize, field: &str, value: T) -> IndexResult<()> {
    if slot.is_some() {
        return Err(IndexError::malformed(
            "index",
            line,
            format!("duplicate {field} line"),
        ));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_parent(value: &str, line: usize) -> IndexResult<Parent> {
    match value {
        "none" => Ok(Parent::Root),
        "truncated" => Ok(Parent::Truncated),
        other => ObjectKey::from_hex(other)
            .map(Parent::Index)
            .map_err(|e| IndexError::malformed("index", line, format!("prev: {e}"))),
    }
}

fn parse_optional_key(
    value: &str,
    absent: &[&str],
    line: usize,
) -> IndexResult<Option<ObjectKey>> {
    if absent.contains(&value) {
        return Ok(None);
    }
    ObjectKey::from_hex(value)
        .map(Some)
        .map_err(|e| IndexError::malformed("index", line, format!("{value:?}: {e}")))
}

fn parse_elem(value: &str, line: usize) -> IndexResult<(ElementKey, ElementRecord)> {
    let fields: Vec<&str> = value.splitn(5, ',').collect();
    let [local, base, fingerprint, history, key] = fields[..] else {
        return Err(IndexError::malformed(
            "index",
            line,
            format!("expected 5 fields, found {}", fields.len()),
        ));
    };

    let key = ElementKey::parse(key).map_err(|e| IndexError::malformed("index", line, e.to_string()))?;
    let fingerprint = match fingerprint {
        NULL => None,
        fp => Some(
            Fingerprint::new(fp).map_err(|e| IndexError::malformed("index", line, e.to_string()))?,
        ),
    };
    let record = ElementRecord {
        local: parse_optional_key(local, &[NO_LOCAL, NULL], line)?,
        base: parse_optional_key(base, &[NO_BASE, NULL], line)?,
        fingerprint,
        history: parse_optional_key(history, &[NULL], line)?,
    };
    Ok((key, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stage() -> StageId {
        StageId::parse("DEV-1-SYS-SUB").unwrap()
    }

    fn sample() -> Index {
        let mut index = Index::new(stage(), IndexStatus::Fetch);
        index.message = "initial fetch".into();
        index.type_list = Some(ObjectKey::digest(b"types"));
        index.elements.insert(
            ElementKey::parse("ASMPGM/FOO").unwrap(),
            ElementRecord {
                local: Some(ObjectKey::digest(b"HELLO")),
                base: Some(ObjectKey::digest(b"HELLO")),
                fingerprint: Some(Fingerprint::new("FP1").unwrap()),
                history: None,
            },
        );
        index.elements.insert(
            ElementKey::parse("COBOL/BAR").unwrap(),
            ElementRecord::default(),
        );
        index
    }

    #[test]
    fn encode_layout() {
        let index = sample();
        let text = index.encode();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0], "prev none");
        assert_eq!(lines[1], "stage DEV-1-SYS-SUB");
        assert_eq!(lines[2], "status fetch");
        assert_eq!(lines[3], "message initial fetch");
        assert!(lines[4].starts_with("type "));
        assert!(lines[5].ends_with(",FP1,null,ASMPGM/FOO"));
        assert_eq!(lines[6], "elem lsha1,rsha1,null,null,COBOL/BAR");
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn decode_inverts_encode() {
        let index = sample();
        assert_eq!(Index::decode(&index.encode()).unwrap(), index);
    }

    #[test]
    fn decode_accepts_null_for_local_and_base() {
        let text = "prev none\nstage S\nstatus fetch\nmessage \ntype null\nelem null,null,null,null,T/E";
        let index = Index::decode(text).unwrap();
        let rec = index.get(&ElementKey::parse("T/E").unwrap()).unwrap();
        assert_eq!(rec, &ElementRecord::default());
        // Re-encoding normalizes to the canonical sentinels.
        assert!(index.encode().ends_with("elem lsha1,rsha1,null,null,T/E"));
    }

    #[test]
    fn element_key_may_contain_commas() {
        let text = "prev none\nstage S\nstatus fetch\nmessage \ntype null\nelem lsha1,rsha1,null,null,T/A,B";
        let index = Index::decode(text).unwrap();
        assert!(index.get(&ElementKey::parse("T/A,B").unwrap()).is_some());
    }

    #[test]
    fn unknown_line_is_malformed() {
        let text = format!("{}\nbogus line", sample().encode());
        assert!(matches!(
            Index::decode(&text),
            Err(IndexError::MalformedRecord { line: 8, .. })
        ));
    }

    #[test]
    fn short_elem_line_is_malformed() {
        let text = "prev none\nstage S\nstatus fetch\nmessage \ntype null\nelem a,b,T/E";
        assert!(matches!(
            Index::decode(text),
            Err(IndexError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn missing_header_is_malformed() {
        let text = "prev none\nstage S\nstatus fetch\ntype null";
        assert!(matches!(
            Index::decode(text),
            Err(IndexError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn message_is_flattened_to_one_line() {
        let mut index = sample();
        index.message = "two\nlines".into();
        let decoded = Index::decode(&index.encode()).unwrap();
        assert_eq!(decoded.message, "two lines");
    }

    #[test]
    fn successor_links_to_parent() {
        let index = sample();
        let key = ObjectKey::digest(index.encode().as_bytes());
        let next = index.successor(key, IndexStatus::Commit, "edit");
        assert_eq!(next.prev, Parent::Index(key));
        assert_eq!(next.elements, index.elements);
        assert_eq!(next.status, IndexStatus::Commit);
    }

    fn arb_key() -> impl Strategy<Value = Option<ObjectKey>> {
        proptest::option::of(any::<[u8; 20]>().prop_map(ObjectKey::from_digest))
    }

    proptest! {
        #[test]
        fn canonical_encoding_roundtrips(
            elems in proptest::collection::btree_map(
                "[A-Z]{1,8}/[A-Z#$@0-9]{1,8}",
                (arb_key(), arb_key(), proptest::option::of("[A-Z0-9]{1,12}"), arb_key()),
                0..8,
            ),
            message in "[ -~]{0,40}",
        ) {
            let mut index = Index::new(stage(), IndexStatus::Pull);
            index.message = message;
            for (k, (local, base, fp, history)) in elems {
                index.elements.insert(
                    ElementKey::parse(&k).unwrap(),
                    ElementRecord {
                        local,
                        base,
                        fingerprint: fp.map(|f| Fingerprint::new(f).unwrap()),
                        history,
                    },
                );
            }
            let text = index.encode();
            let decoded = Index::decode(&text).unwrap();
            prop_assert_eq!(decoded.encode(), text);
            prop_assert_eq!(decoded, index);
        }
    }
}
