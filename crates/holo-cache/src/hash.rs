//! Content hashing for chunks.
//!
//! BLAKE3 over the raw chunk text: order and whitespace sensitive, position
//! independent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A content hash using BLAKE3.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkHash {
    bytes: [u8; 32],
}

impl ChunkHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Hash arbitrary data.
    pub fn of(data: &[u8]) -> Self {
        Self {
            bytes: *blake3::hash(data).as_bytes(),
        }
    }

    /// Hash a string.
    pub fn of_str(s: &str) -> Self {
        Self::of(s.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Full hex string.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.bytes).to_hex().to_string()
    }

    /// First 16 hex characters, for display.
    pub fn to_short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(16);
        hex
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({})", self.to_short_hex())
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_short_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_whitespace_sensitive() {
        assert_eq!(ChunkHash::of_str("orb a {}"), ChunkHash::of_str("orb a {}"));
        assert_ne!(ChunkHash::of_str("orb a {}"), ChunkHash::of_str("orb a  {}"));
        assert_ne!(ChunkHash::of_str("ab"), ChunkHash::of_str("ba"));
    }

    #[test]
    fn test_hex() {
        let hash = ChunkHash::of_str("hello");
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(hash.to_short_hex().len(), 16);
        assert!(hash.to_hex().starts_with(&hash.to_short_hex()));
    }
}
