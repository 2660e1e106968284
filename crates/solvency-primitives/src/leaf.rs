//! Liability leaves
//!
//! A leaf binds an opaque user identifier to a non-negative amount. The
//! 32-byte amount encoding is computed once at construction, so a leaf that
//! exists is always hashable.

use crate::amount::{Amount, AmountError, AMOUNT_BYTES};
use crate::hash::{hash_leaf, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier (a UTF-8 user id or an address, in practice)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(Vec<u8>);

impl UserId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 view, when the identifier is textual
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl AsRef<[u8]> for UserId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for UserId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(s) => serializer.serialize_str(s),
            None => Err(serde::ser::Error::custom(
                "user id is not valid UTF-8 and cannot be serialized as a string",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from(String::deserialize(deserializer)?))
    }
}

/// A single `(userId, amount)` commitment unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LeafRecord", into = "LeafRecord")]
pub struct Leaf {
    key: UserId,
    value: Amount,
    encoded_value: [u8; AMOUNT_BYTES],
}

impl Leaf {
    /// Fails if the amount does not fit the fixed 32-byte encoding
    pub fn new(key: impl Into<UserId>, value: Amount) -> Result<Self, AmountError> {
        let encoded_value = value.to_be_bytes32()?;
        Ok(Self {
            key: key.into(),
            value,
            encoded_value,
        })
    }

    pub fn key(&self) -> &UserId {
        &self.key
    }

    pub fn value(&self) -> &Amount {
        &self.value
    }

    /// Domain-separated leaf digest
    pub fn hash(&self) -> Digest {
        hash_leaf(self.key.as_bytes(), &self.encoded_value)
    }
}

/// Wire shape of a leaf: `{ userId, amount }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafRecord {
    pub user_id: UserId,
    pub amount: Amount,
}

impl TryFrom<LeafRecord> for Leaf {
    type Error = AmountError;

    fn try_from(record: LeafRecord) -> Result<Self, Self::Error> {
        Leaf::new(record.user_id, record.amount)
    }
}

impl From<Leaf> for LeafRecord {
    fn from(leaf: Leaf) -> Self {
        Self {
            user_id: leaf.key,
            amount: leaf.value,
        }
    }
}
