//! SHA-256 Merkle tree over liability leaves
//!
//! Levels are built bottom-up with pairwise node hashing. When a level has an
//! odd number of nodes the last node is duplicated and hashed with itself, so
//! every proof path has exactly `ceil(log2(leaf_count))` siblings. Leaf order
//! is the caller's; [`crate::LiabilityLedger::to_leaves`] sorts by key bytes.

use crate::error::{MerkleError, MerkleResult};
use crate::proof::{verify_inclusion, InclusionProof, PathBit};
use solvency_primitives::{hash_node, Amount, Digest, Leaf, UserId};
use std::collections::HashMap;
use tracing::info;

/// An immutable liability Merkle tree
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Leaves in build order
    leaves: Vec<Leaf>,

    /// Node digests by level (level 0 = leaf hashes, last level = `[root]`)
    levels: Vec<Vec<Digest>>,

    /// Key -> position in `leaves`
    positions: HashMap<UserId, usize>,

    /// The root digest
    root: Digest,
}

impl MerkleTree {
    /// Build a tree from an ordered list of leaves
    ///
    /// Fails on an empty list and on duplicate keys; leaves are never dropped
    /// or merged.
    pub fn build(leaves: Vec<Leaf>) -> MerkleResult<Self> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let mut positions = HashMap::with_capacity(leaves.len());
        for (i, leaf) in leaves.iter().enumerate() {
            if let Some(first) = positions.insert(leaf.key().clone(), i) {
                return Err(MerkleError::DuplicateLeaf {
                    key: leaf.key().to_string(),
                    first,
                    second: i,
                });
            }
        }

        let leaf_hashes: Vec<Digest> = leaves.iter().map(Leaf::hash).collect();

        let mut levels = vec![leaf_hashes];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    hash_node(left, right)
                })
                .collect();
            levels.push(next);
        }

        let root = levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .ok_or(MerkleError::EmptyTree)?;

        info!(
            leaf_count = leaves.len(),
            depth = levels.len() - 1,
            root = %root,
            "built liability merkle tree"
        );

        Ok(Self {
            leaves,
            levels,
            positions,
            root,
        })
    }

    /// Get the root digest
    pub fn root(&self) -> Digest {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of levels above the leaves (equals every proof's path length)
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Position of `key` in build order
    pub fn position(&self, key: &UserId) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Sum of all leaf amounts
    pub fn total(&self) -> Amount {
        self.leaves.iter().map(Leaf::value).sum()
    }

    /// Produce the inclusion proof for `key`
    pub fn prove_inclusion(&self, key: &UserId) -> MerkleResult<InclusionProof> {
        let leaf_index = self
            .position(key)
            .ok_or_else(|| MerkleError::KeyNotFound {
                key: key.to_string(),
            })?;
        let leaf = &self.leaves[leaf_index];

        let mut sibling_path = Vec::with_capacity(self.depth());
        let mut path_bits = Vec::with_capacity(self.depth());
        let mut index = leaf_index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = index ^ 1;
            // Missing right sibling: the node was paired with itself.
            let sibling = level.get(sibling_index).unwrap_or(&level[index]);
            sibling_path.push(*sibling);
            path_bits.push(PathBit::for_index(index));
            index /= 2;
        }

        Ok(InclusionProof {
            key: leaf.key().clone(),
            value: leaf.value().clone(),
            sibling_path,
            path_bits,
            root: self.root,
            leaf_index: leaf_index as u64,
            leaf_count: self.leaves.len() as u64,
        })
    }

    /// Stateless verification; see [`verify_inclusion`]
    pub fn verify_inclusion(proof: &InclusionProof, expected_root: &Digest) -> bool {
        verify_inclusion(proof, expected_root)
    }
}
