use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Length of a rendered key in hex characters.
pub const KEY_HEX_LEN: usize = 40;

/// Content key of a stored object.
///
/// An `ObjectKey` is the SHA-1 digest of an object's full frame (header plus
/// payload). Identical frames always produce the same key, so objects are
/// deduplicated and verifiable on read.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey([u8; 20]);

impl ObjectKey {
    /// Compute the key of a byte buffer.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create a key from a pre-computed digest.
    pub fn from_digest(digest: [u8; 20]) -> Self {
        Self(digest)
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex rendering (40 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(TypeError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` if `s` has the shape of a rendered key.
    ///
    /// Used to tell a direct key apart from a stage name wherever both are
    /// accepted.
    pub fn looks_like_key(s: &str) -> bool {
        s.len() == KEY_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// First two hex characters: the shard directory of the object file.
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Remaining 38 hex characters: the object file name inside its shard.
    pub fn file_name(&self) -> String {
        hex::encode(&self.0[1..])
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.short_hex())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_matches_known_sha1() {
        let key = ObjectKey::digest(b"abc");
        assert_eq!(key.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn hex_roundtrip() {
        let key = ObjectKey::digest(b"test");
        let parsed = ObjectKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ObjectKey::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 20, actual: 2 });
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            ObjectKey::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn shard_and_file_name_split_the_hex() {
        let key = ObjectKey::digest(b"shard");
        let hex = key.to_hex();
        assert_eq!(key.shard(), &hex[..2]);
        assert_eq!(key.file_name(), &hex[2..]);
    }

    #[test]
    fn looks_like_key_accepts_only_lowercase_hex_of_full_length() {
        let key = ObjectKey::digest(b"x");
        assert!(ObjectKey::looks_like_key(&key.to_hex()));
        assert!(!ObjectKey::looks_like_key(&key.to_hex().to_uppercase()));
        assert!(!ObjectKey::looks_like_key("DEV-1-SYS-SUB"));
        assert!(!ObjectKey::looks_like_key(""));
    }

    #[test]
    fn serde_uses_hex_string() {
        let key = ObjectKey::digest(b"serde");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.to_hex()));
        let back: ObjectKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn debug_uses_short_hex() {
        let key = ObjectKey::digest(b"dbg");
        assert_eq!(format!("{key:?}"), format!("ObjectKey({})", key.short_hex()));
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(ObjectKey::digest(&data), ObjectKey::digest(&data));
        }
    }
}
