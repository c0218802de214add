//! Element type metadata stored as `type` objects.
//!
//! One `typeName,dataFormat,recordLength` line per type, ordered by type
//! name, no trailing newline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// How element content of a type is stored upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFormat {
    /// `T`: line-oriented text, eligible for diff and merge.
    Text,
    /// `B`: opaque bytes.
    Binary,
    /// Any other code; handled as text.
    Other(String),
}

impl DataFormat {
    pub fn parse(code: &str) -> Self {
        match code {
            "T" => Self::Text,
            "B" => Self::Binary,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("T"),
            Self::Binary => f.write_str("B"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// Metadata of one element type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub type_name: String,
    pub data_format: DataFormat,
    pub record_length: u32,
}

/// The set of element types defined at a stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeList {
    types: BTreeMap<String, TypeRecord>,
}

impl TypeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: TypeRecord) {
        self.types.insert(record.type_name.clone(), record);
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeRecord> {
        self.types.get(type_name)
    }

    /// Type names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeRecord> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether elements of `type_name` are binary. Unknown types are text.
    pub fn is_binary(&self, type_name: &str) -> bool {
        self.get(type_name).is_some_and(|t| t.data_format.is_binary())
    }

    pub fn encode(&self) -> String {
        self.types
            .values()
            .map(|t| format!("{},{},{}", t.type_name, t.data_format, t.record_length))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn decode(text: &str) -> IndexResult<Self> {
        let mut list = Self::new();
        if text.is_empty() {
            return Ok(list);
        }
        for (i, line) in text.split('\n').enumerate() {
            let n = i + 1;
            let fields: Vec<&str> = line.split(',').collect();
            let [type_name, format, length] = fields[..] else {
                return Err(IndexError::malformed(
                    "type list",
                    n,
                    format!("expected 3 fields in {line:?}"),
                ));
            };
            if type_name.is_empty() {
                return Err(IndexError::malformed("type list", n, "empty type name"));
            }
            let record_length = length.trim().parse().map_err(|_| {
                IndexError::malformed("type list", n, format!("bad record length {length:?}"))
            })?;
            list.insert(TypeRecord {
                type_name: type_name.to_string(),
                data_format: DataFormat::parse(format),
                record_length,
            });
        }
        Ok(list)
    }
}

impl FromIterator<TypeRecord> for TypeList {
    fn from_iter<I: IntoIterator<Item = TypeRecord>>(iter: I) -> Self {
        let mut list = Self::new();
        for record in iter {
            list.insert(record);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, format: DataFormat, len: u32) -> TypeRecord {
        TypeRecord {
            type_name: name.into(),
            data_format: format,
            record_length: len,
        }
    }

    #[test]
    fn encode_is_sorted() {
        let list: TypeList = [
            record("LOADMOD", DataFormat::Binary, 0),
            record("COBOL", DataFormat::Text, 80),
        ]
        .into_iter()
        .collect();
        assert_eq!(list.encode(), "COBOL,T,80\nLOADMOD,B,0");
    }

    #[test]
    fn decode_roundtrip() {
        let list = TypeList::decode("ASMPGM,T,80\nJCL,T,80\nOBJ,B,0").unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.is_binary("OBJ"));
        assert!(!list.is_binary("ASMPGM"));
        assert!(!list.is_binary("UNKNOWN"));
        assert_eq!(TypeList::decode(&list.encode()).unwrap(), list);
    }

    #[test]
    fn empty_list() {
        assert!(TypeList::decode("").unwrap().is_empty());
        assert_eq!(TypeList::new().encode(), "");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(TypeList::decode("COBOL,T").is_err());
        assert!(TypeList::decode("COBOL,T,eighty").is_err());
        assert!(TypeList::decode(",T,80").is_err());
    }
}
