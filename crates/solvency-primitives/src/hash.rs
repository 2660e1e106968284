//! Domain-separated hashing
//!
//! Every commitment in the system is a SHA-256 digest of a one-byte domain tag
//! followed by length-prefixed fields:
//!
//! ```text
//! hash(tag, [f0, f1, ..]) = SHA256(tag || u64_be(len(f0)) || f0 || u64_be(len(f1)) || f1 || ..)
//! ```
//!
//! Leaves and internal nodes use distinct tags, so an internal node can never
//! be presented as a leaf (and vice versa).

use sha2::{Digest as _, Sha256};

/// Domain tag for liability leaves
pub const DOMAIN_LEAF: u8 = 0x00;

/// Domain tag for internal Merkle nodes
pub const DOMAIN_NODE: u8 = 0x01;

/// Domain tag for off-chain session state commitments
pub const DOMAIN_SESSION_STATE: u8 = 0x02;

/// Domain tag for session channel identifiers
pub const DOMAIN_CHANNEL_ID: u8 = 0x03;

/// A 256-bit digest (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Create a zero digest
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from hex string, with or without a `0x` prefix
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes: Vec<u8> = hex::decode(hex)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Convert to a `0x`-prefixed lowercase hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute SHA-256 with a byte-string domain prefix
    pub fn sha256_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl serde::Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash an ordered sequence of fields under a domain tag
pub fn hash_fields(tag: u8, fields: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([tag]);
    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }
    Digest(hasher.finalize().into())
}

/// Hash a leaf from its key bytes and its fixed-width amount encoding
pub fn hash_leaf(key: &[u8], amount_be: &[u8; 32]) -> Digest {
    hash_fields(DOMAIN_LEAF, &[key, amount_be])
}

/// Hash two child digests into their parent
pub fn hash_node(left: &Digest, right: &Digest) -> Digest {
    hash_fields(DOMAIN_NODE, &[left.as_bytes(), right.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip_with_prefix() {
        let digest = hash_fields(DOMAIN_LEAF, &[b"alice"]);
        let hex = digest.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert_eq!(Digest::from_hex(&hex).unwrap(), digest);
        assert_eq!(Digest::from_hex(&hex[2..]).unwrap(), digest);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(Digest::from_hex("0xabcd").is_err());
        assert!(Digest::from_hex("zz").is_err());
    }

    #[test]
    fn test_leaf_and_node_domains_differ() {
        let left = Digest([1u8; 32]);
        let right = Digest([2u8; 32]);
        let as_node = hash_node(&left, &right);
        let as_fields = hash_fields(DOMAIN_LEAF, &[left.as_bytes(), right.as_bytes()]);
        assert_ne!(as_node, as_fields);
    }

    #[test]
    fn test_length_prefix_prevents_concatenation_ambiguity() {
        let a = hash_fields(DOMAIN_LEAF, &[b"ab", b"c"]);
        let b = hash_fields(DOMAIN_LEAF, &[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let amount = [7u8; 32];
        assert_eq!(hash_leaf(b"bob", &amount), hash_leaf(b"bob", &amount));
    }

    #[test]
    fn test_serde_uses_prefixed_hex() {
        let digest = Digest([0xab; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        let parsed: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, digest);
    }
}
