use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content digest of a single file chunk.
///
/// A `ChunkDigest` is the BLAKE3 hash of a chunk's raw bytes — the bytes
/// actually present in the file, never a zero-padded block. Digests travel
/// hex-encoded (64 characters) in store records and on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkDigest([u8; 32]);

/// Length of a hex-encoded digest.
pub const HEX_LEN: usize = 64;

impl ChunkDigest {
    /// Digest raw chunk bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed 32-byte hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ChunkDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkDigest({})", self.short_hex())
    }
}

impl fmt::Display for ChunkDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for ChunkDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<ChunkDigest> for [u8; 32] {
    fn from(d: ChunkDigest) -> Self {
        d.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_is_deterministic() {
        let data = b"hello world";
        let d1 = ChunkDigest::of(data);
        let d2 = ChunkDigest::of(data);
        assert_eq!(d1, d2);
    }

    #[test]
    fn different_data_produces_different_digests() {
        assert_ne!(ChunkDigest::of(b"hello"), ChunkDigest::of(b"world"));
    }

    #[test]
    fn hex_roundtrip() {
        let d = ChunkDigest::of(b"chunk");
        let parsed = ChunkDigest::from_hex(&d.to_hex()).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn hex_is_64_chars() {
        let d = ChunkDigest::of(b"chunk");
        assert_eq!(d.to_hex().len(), HEX_LEN);
        assert_eq!(format!("{d}").len(), HEX_LEN);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(
            ChunkDigest::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
        assert!(matches!(
            ChunkDigest::from_hex("abcd"),
            Err(TypeError::InvalidLength { expected: 32, actual: 2 })
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(ChunkDigest::of(b"x").short_hex().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let d = ChunkDigest::of(b"serde");
        let json = serde_json::to_string(&d).unwrap();
        let parsed: ChunkDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, parsed);
    }
}
