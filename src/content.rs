//! Content addressing for uploaded documents.
//!
//! Every uploaded byte sequence is identified by a 256-bit BLAKE3 digest.
//! The digest is the sole identity used for blob deduplication and for the
//! document-index composite key, so identical bytes always resolve to the
//! same blob and the same cached summary regardless of filename.

use std::fmt;

/// Raw upload handed to the ingest workflow by the caller.
///
/// Ephemeral: created per request, discarded after ingestion. The original
/// filename is carried along as informational metadata only; it never
/// participates in identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedContent {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl UploadedContent {
    pub fn new(bytes: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 256-bit content digest. Same bytes always produce the same hash;
/// distinct bytes collide only with negligible probability.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash the exact byte sequence. Deterministic, no side effects.
    pub fn address_of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    /// Storage key under which the blob is stored (the hex digest).
    pub fn storage_key(&self) -> String {
        self.to_hex()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_hash() {
        let a = ContentHash::address_of(b"hello");
        let b = ContentHash::address_of(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn different_bytes_different_hash() {
        let a = ContentHash::address_of(b"hello");
        let b = ContentHash::address_of(b"hello!");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let hex = ContentHash::address_of(b"payload").to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
