//! Solvency Primitives
//!
//! Building blocks shared by every proof-of-solvency component:
//! - Domain-separated SHA-256 hashing (`hash_fields`, leaf and node digests)
//! - Arbitrary-precision amounts with a fixed 32-byte hash encoding
//! - Liability leaves (`UserId`, `Leaf`)
//! - Canonical public inputs for the proof-generation collaborator

pub mod amount;
pub mod hash;
pub mod leaf;
pub mod public_inputs;

pub use amount::{Amount, AmountError, SignedAmount, AMOUNT_BYTES};
pub use hash::{
    hash_fields, hash_leaf, hash_node, Digest, DOMAIN_CHANNEL_ID, DOMAIN_LEAF, DOMAIN_NODE,
    DOMAIN_SESSION_STATE,
};
pub use leaf::{Leaf, LeafRecord, UserId};
pub use public_inputs::{
    canonical_json, compute_public_inputs_hash, PublicInputsError, SolvencyPublicInputs,
};
