//! Solvency Merkle Commitments
//!
//! This crate commits to every user liability with a SHA-256 Merkle tree and
//! issues per-user inclusion proofs that verify offline against the published
//! root.
//!
//! # Usage
//!
//! ```
//! use solvency_merkle::{LiabilityLedger, MerkleTree};
//! use solvency_primitives::{Amount, UserId};
//!
//! let mut ledger = LiabilityLedger::new();
//! ledger.set_balance("alice", Amount::from(100u64)).unwrap();
//! ledger.set_balance("bob", Amount::from(200u64)).unwrap();
//!
//! let tree = ledger.build_tree().unwrap();
//! let proof = tree.prove_inclusion(&UserId::from("bob")).unwrap();
//! assert!(MerkleTree::verify_inclusion(&proof, &tree.root()));
//! ```

pub mod error;
pub mod ledger;
pub mod proof;
pub mod serialization;
pub mod tree;

pub use error::{MerkleError, MerkleResult};
pub use ledger::{LiabilityCommitment, LiabilityLedger};
pub use proof::{verify_inclusion, InclusionProof, PathBit};
pub use serialization::{LiabilitySnapshot, SerializableInclusionProof};
pub use tree::MerkleTree;
