//! Wire formats for inclusion proofs and liability snapshots
//!
//! Inclusion proofs travel as JSON for end users. Liability snapshots travel as
//! JSON or as a two-column CSV. Amounts are decimal strings in both, so no value
//! ever passes through a float.

use crate::error::{MerkleError, MerkleResult};
use crate::ledger::LiabilityLedger;
use crate::proof::{InclusionProof, PathBit};
use serde::{Deserialize, Serialize};
use solvency_primitives::{Amount, Digest, Leaf, UserId};

/// CSV header written by [`LiabilitySnapshot::to_csv`]
pub const CSV_HEADER: &str = "userId,amount";

/// Header produced by the legacy liabilities upload
pub const LEGACY_CSV_HEADER: &str = "user_id,balance";

/// Inclusion proof as handed to an end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableInclusionProof {
    pub user_id: UserId,
    pub amount: Amount,
    /// Sibling digests, leaf level first
    pub proof: Vec<Digest>,
    /// 0 = current node is the left child, 1 = right child
    pub path_indices: Vec<u8>,
    pub root: Digest,
    pub leaf_index: u64,
    pub leaf_count: u64,
}

impl SerializableInclusionProof {
    /// Serialize to JSON
    pub fn to_json(&self) -> MerkleResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MerkleError::SerializationFailed(format!("JSON error: {}", e)))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> MerkleResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MerkleError::DeserializationFailed(format!("JSON error: {}", e)))
    }

    /// Convert into a verifiable proof, rejecting path indices other than 0/1
    pub fn into_proof(self) -> MerkleResult<InclusionProof> {
        let path_bits = self
            .path_indices
            .iter()
            .map(|&bit| {
                PathBit::from_u8(bit).ok_or_else(|| {
                    MerkleError::DeserializationFailed(format!("invalid path index {}", bit))
                })
            })
            .collect::<MerkleResult<Vec<_>>>()?;

        Ok(InclusionProof {
            key: self.user_id,
            value: self.amount,
            sibling_path: self.proof,
            path_bits,
            root: self.root,
            leaf_index: self.leaf_index,
            leaf_count: self.leaf_count,
        })
    }
}

impl From<&InclusionProof> for SerializableInclusionProof {
    fn from(proof: &InclusionProof) -> Self {
        Self {
            user_id: proof.key.clone(),
            amount: proof.value.clone(),
            proof: proof.sibling_path.clone(),
            path_indices: proof.path_bits.iter().map(|b| b.as_u8()).collect(),
            root: proof.root,
            leaf_index: proof.leaf_index,
            leaf_count: proof.leaf_count,
        }
    }
}

/// Exported `{ userId, amount }` list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiabilitySnapshot {
    pub entries: Vec<Leaf>,
}

impl LiabilitySnapshot {
    pub fn new(entries: Vec<Leaf>) -> Self {
        Self { entries }
    }

    pub fn from_ledger(ledger: &LiabilityLedger) -> Self {
        Self::new(ledger.to_leaves())
    }

    /// Load into a ledger; duplicate user ids are rejected
    pub fn into_ledger(self) -> MerkleResult<LiabilityLedger> {
        LiabilityLedger::from_leaves(self.entries)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> MerkleResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MerkleError::SerializationFailed(format!("JSON error: {}", e)))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> MerkleResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MerkleError::DeserializationFailed(format!("JSON error: {}", e)))
    }

    /// Serialize as `userId,amount` CSV with a header row
    pub fn to_csv(&self) -> MerkleResult<String> {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for (i, leaf) in self.entries.iter().enumerate() {
            let user = leaf.key().as_str().ok_or_else(|| MerkleError::InvalidCsv {
                line: i + 2,
                reason: "user id is not valid UTF-8".to_string(),
            })?;
            // from_csv trims fields, so padded ids would not survive a reload
            if user.is_empty() || user != user.trim() || user.contains([',', '\n', '\r', '"']) {
                return Err(MerkleError::InvalidCsv {
                    line: i + 2,
                    reason: format!("user id {:?} cannot be written as a CSV field", user),
                });
            }
            out.push_str(user);
            out.push(',');
            out.push_str(&leaf.value().to_string());
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse a two-column CSV; the header row is optional
    pub fn from_csv(csv: &str) -> MerkleResult<Self> {
        let mut entries = Vec::new();
        let csv = csv.strip_prefix('\u{feff}').unwrap_or(csv);
        for (i, raw) in csv.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line_no == 1 && (line == CSV_HEADER || line == LEGACY_CSV_HEADER) {
                continue;
            }

            let mut fields = line.split(',');
            let (user, amount) = match (fields.next(), fields.next(), fields.next()) {
                (Some(user), Some(amount), None) => (user.trim(), amount.trim()),
                _ => {
                    return Err(MerkleError::InvalidCsv {
                        line: line_no,
                        reason: "expected exactly two columns".to_string(),
                    })
                }
            };
            if user.is_empty() {
                return Err(MerkleError::InvalidCsv {
                    line: line_no,
                    reason: "empty user id".to_string(),
                });
            }
            let amount = Amount::parse_decimal(amount).map_err(|e| MerkleError::InvalidCsv {
                line: line_no,
                reason: e.to_string(),
            })?;
            let leaf = Leaf::new(user, amount).map_err(|e| MerkleError::InvalidCsv {
                line: line_no,
                reason: e.to_string(),
            })?;
            entries.push(leaf);
        }
        Ok(Self { entries })
    }
}
