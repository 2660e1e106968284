//! Fuzz target for inclusion proof verification
//!
//! This target ensures:
//! 1. Verification never panics on attacker-chosen proof structures
//! 2. Whatever verifies against the genuine root names a real (key, value) leaf

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use solvency_merkle::{InclusionProof, MerkleTree, PathBit};
use solvency_primitives::{Amount, Digest, Leaf, UserId};

#[derive(Debug, Arbitrary)]
struct ProofInput {
    /// Number of leaves in the genuine tree
    tree_size: u8,
    /// Leaf whose proof is mutated
    target: u8,
    /// Replacement fields, applied when present
    key: Option<Vec<u8>>,
    value: Option<u128>,
    siblings: Option<Vec<[u8; 32]>>,
    bits: Option<Vec<bool>>,
    leaf_index: Option<u64>,
    leaf_count: Option<u64>,
}

fuzz_target!(|input: ProofInput| {
    let size = (input.tree_size as usize % 64) + 1;
    let leaves: Vec<Leaf> = (0..size)
        .map(|i| Leaf::new(format!("user_{}", i), Amount::from(i as u64 * 7 + 1)).unwrap())
        .collect();
    let tree = MerkleTree::build(leaves).unwrap();
    let root = tree.root();

    let target = input.target as usize % size;
    let genuine = tree
        .prove_inclusion(&UserId::from(format!("user_{}", target)))
        .unwrap();
    assert!(MerkleTree::verify_inclusion(&genuine, &root));

    let mut proof: InclusionProof = genuine.clone();
    if let Some(key) = input.key {
        proof.key = UserId::new(key.into_iter().take(256).collect::<Vec<u8>>());
    }
    if let Some(value) = input.value {
        proof.value = Amount::from(value);
    }
    if let Some(siblings) = input.siblings {
        proof.sibling_path = siblings.into_iter().take(80).map(Digest::from_bytes).collect();
    }
    if let Some(bits) = input.bits {
        proof.path_bits = bits
            .into_iter()
            .take(80)
            .map(|b| if b { PathBit::Right } else { PathBit::Left })
            .collect();
    }
    if let Some(index) = input.leaf_index {
        proof.leaf_index = index;
    }
    if let Some(count) = input.leaf_count {
        proof.leaf_count = count;
    }

    let accepted = MerkleTree::verify_inclusion(&proof, &root);
    if accepted {
        assert!(tree
            .leaves()
            .iter()
            .any(|leaf| leaf.key() == &proof.key && leaf.value() == &proof.value));
    }
});
