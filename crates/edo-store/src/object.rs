use edo_types::ObjectKey;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Element content, exactly as found in the working file.
    Blob,
    /// An encoded index snapshot.
    List,
    /// An encoded type list.
    Type,
    /// A remote change history in fixed-column form.
    Logs,
}

impl ObjectKind {
    /// The tag written into the frame header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::List => "list",
            Self::Type => "type",
            Self::Logs => "logs",
        }
    }

    /// Parse a frame header tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "blob" => Some(Self::Blob),
            "list" => Some(Self::List),
            "type" => Some(Self::Type),
            "logs" => Some(Self::Logs),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + payload bytes.
///
/// `StoredObject` is the unit of storage. On disk it is written as a frame,
/// `"<kind> <len>\0" + data`, and keyed by the SHA-1 of that frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes.
    pub data: Vec<u8>,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Render the on-disk frame.
    pub fn frame(&self) -> Vec<u8> {
        let header = format!("{} {}\0", self.kind, self.data.len());
        let mut frame = Vec::with_capacity(header.len() + self.data.len());
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(&self.data);
        frame
    }

    /// Compute the content key of this object.
    pub fn compute_key(&self) -> ObjectKey {
        ObjectKey::digest(&self.frame())
    }

    /// Decode and verify a raw frame read back for `key`.
    ///
    /// The digest is recomputed over the entire raw content before the
    /// header is looked at, so any corruption surfaces as
    /// [`StoreError::IntegrityMismatch`].
    pub fn from_frame(key: &ObjectKey, raw: &[u8]) -> StoreResult<Self> {
        let computed = ObjectKey::digest(raw);
        if computed != *key {
            return Err(StoreError::IntegrityMismatch {
                key: *key,
                computed,
            });
        }

        let corrupt = |reason: String| StoreError::CorruptObject { key: *key, reason };

        let nul = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator".into()))?;
        let header = std::str::from_utf8(&raw[..nul])
            .map_err(|_| corrupt("header is not valid UTF-8".into()))?;
        let (tag, len) = header
            .split_once(' ')
            .ok_or_else(|| corrupt(format!("malformed header {header:?}")))?;
        let kind = ObjectKind::from_tag(tag)
            .ok_or_else(|| corrupt(format!("unknown object kind {tag:?}")))?;
        let declared: usize = len
            .parse()
            .map_err(|_| corrupt(format!("malformed length {len:?}")))?;

        let data = raw[nul + 1..].to_vec();
        if data.len() != declared {
            return Err(corrupt(format!(
                "declared length {declared}, found {}",
                data.len()
            )));
        }
        Ok(Self { kind, data })
    }
}

/// Key a working file would get if stored as a blob.
///
/// Working files are compared against index references by this key, so a
/// file whose content matches a committed version hashes to the same key.
pub fn blob_key(content: &[u8]) -> ObjectKey {
    StoredObject::new(ObjectKind::Blob, content.to_vec()).compute_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let obj = StoredObject::new(ObjectKind::Blob, b"HELLO\n".to_vec());
        assert_eq!(obj.frame(), b"blob 6\0HELLO\n".to_vec());
    }

    #[test]
    fn key_is_git_compatible_for_blobs() {
        // Same framing as `git hash-object`, so the digests agree.
        let obj = StoredObject::new(ObjectKind::Blob, b"hello\n".to_vec());
        assert_eq!(
            obj.compute_key().to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn kind_participates_in_key() {
        let blob = StoredObject::new(ObjectKind::Blob, b"x".to_vec());
        let list = StoredObject::new(ObjectKind::List, b"x".to_vec());
        assert_ne!(blob.compute_key(), list.compute_key());
    }

    #[test]
    fn blob_key_matches_stored_blob() {
        let content = b"WORLD\n";
        let obj = StoredObject::new(ObjectKind::Blob, content.to_vec());
        assert_eq!(blob_key(content), obj.compute_key());
    }

    #[test]
    fn from_frame_roundtrip() {
        let obj = StoredObject::new(ObjectKind::Logs, b"line".to_vec());
        let decoded = StoredObject::from_frame(&obj.compute_key(), &obj.frame()).unwrap();
        assert_eq!(decoded, obj);
    }

    #[test]
    fn from_frame_detects_tampering() {
        let obj = StoredObject::new(ObjectKind::Blob, b"HELLO\n".to_vec());
        let key = obj.compute_key();
        let mut raw = obj.frame();
        *raw.last_mut().unwrap() = b'?';
        assert!(matches!(
            StoredObject::from_frame(&key, &raw),
            Err(StoreError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn from_frame_rejects_bad_declared_length() {
        let raw = b"blob 9\0short".to_vec();
        let key = ObjectKey::digest(&raw);
        assert!(matches!(
            StoredObject::from_frame(&key, &raw),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn from_frame_rejects_unknown_kind() {
        let raw = b"tree 0\0".to_vec();
        let key = ObjectKey::digest(&raw);
        assert!(matches!(
            StoredObject::from_frame(&key, &raw),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn payload_may_contain_nul_bytes() {
        let obj = StoredObject::new(ObjectKind::Blob, vec![1, 0, 2, 0]);
        let decoded = StoredObject::from_frame(&obj.compute_key(), &obj.frame()).unwrap();
        assert_eq!(decoded.data, vec![1, 0, 2, 0]);
    }
}
