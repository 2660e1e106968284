//! Inclusion proofs and stateless verification
//!
//! Verification needs nothing but the proof and the published root, so a user
//! can check their own inclusion offline. Every malformed proof is a `false`
//! result, never a panic.

use serde::{Deserialize, Serialize};
use solvency_primitives::{hash_node, Amount, Digest, Leaf, UserId};
use tracing::warn;

/// Position of the current node relative to its sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathBit {
    /// Current node is the left child; the sibling goes on the right
    Left,
    /// Current node is the right child; the sibling goes on the left
    Right,
}

impl PathBit {
    /// Bit for a node at `index` within its level
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            PathBit::Left
        } else {
            PathBit::Right
        }
    }

    /// Wire encoding: 0 = left, 1 = right
    pub fn as_u8(self) -> u8 {
        match self {
            PathBit::Left => 0,
            PathBit::Right => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PathBit::Left),
            1 => Some(PathBit::Right),
            _ => None,
        }
    }
}

/// Proof that `(key, value)` sits at `leaf_index` of a tree with `leaf_count` leaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub key: UserId,
    pub value: Amount,
    pub sibling_path: Vec<Digest>,
    pub path_bits: Vec<PathBit>,
    pub root: Digest,
    pub leaf_index: u64,
    pub leaf_count: u64,
}

impl InclusionProof {
    /// Shorthand for [`verify_inclusion`]
    pub fn verify(&self, expected_root: &Digest) -> bool {
        verify_inclusion(self, expected_root)
    }
}

/// `ceil(log2(n))` for `n >= 1`
pub(crate) fn ceil_log2(n: u64) -> usize {
    if n <= 1 {
        0
    } else {
        (u64::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// Verify an inclusion proof against a published root
pub fn verify_inclusion(proof: &InclusionProof, expected_root: &Digest) -> bool {
    match check_inclusion(proof, expected_root) {
        Ok(()) => true,
        Err(reason) => {
            warn!(key = %proof.key, reason, "inclusion proof rejected");
            false
        }
    }
}

fn check_inclusion(proof: &InclusionProof, expected_root: &Digest) -> Result<(), &'static str> {
    if proof.sibling_path.len() != proof.path_bits.len() {
        return Err("sibling path and path bits differ in length");
    }
    if proof.leaf_count == 0 {
        return Err("leaf count is zero");
    }
    if proof.sibling_path.len() != ceil_log2(proof.leaf_count) {
        return Err("sibling path length does not match tree size");
    }
    if proof.leaf_index >= proof.leaf_count {
        return Err("leaf index out of range");
    }
    if proof.root != *expected_root {
        return Err("proof root differs from expected root");
    }

    let leaf = Leaf::new(proof.key.clone(), proof.value.clone())
        .map_err(|_| "amount does not fit the leaf encoding")?;

    let mut current = leaf.hash();
    let mut index = proof.leaf_index;
    let mut level_len = proof.leaf_count;

    for (sibling, bit) in proof.sibling_path.iter().zip(proof.path_bits.iter()) {
        let expected_bit = if index % 2 == 0 {
            PathBit::Left
        } else {
            PathBit::Right
        };
        if *bit != expected_bit {
            return Err("path bits do not spell the leaf index");
        }

        // The last node of an odd-length level is paired with itself.
        if index % 2 == 0 && index + 1 == level_len && *sibling != current {
            return Err("duplicated node must be its own sibling");
        }

        current = match bit {
            PathBit::Left => hash_node(&current, sibling),
            PathBit::Right => hash_node(sibling, &current),
        };
        index /= 2;
        level_len = level_len.div_ceil(2);
    }

    if current != *expected_root {
        return Err("recomputed root differs from expected root");
    }
    Ok(())
}
