//! Error types for liability commitment operations

use solvency_primitives::AmountError;
use thiserror::Error;

/// Errors that can occur while building or querying liability commitments
#[derive(Debug, Error)]
pub enum MerkleError {
    /// A tree needs at least one leaf
    #[error("Merkle tree cannot be empty")]
    EmptyTree,

    /// Two leaves share the same key
    #[error("Duplicate leaf key '{key}' at positions {first} and {second}")]
    DuplicateLeaf {
        key: String,
        first: usize,
        second: usize,
    },

    /// Inclusion requested for a key that is not in the tree
    #[error("Key '{key}' not found in tree")]
    KeyNotFound { key: String },

    /// Amount failed validation
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Malformed CSV row
    #[error("Invalid CSV at line {line}: {reason}")]
    InvalidCsv { line: usize, reason: String },

    /// Serialization error
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization error
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

/// Result type for liability commitment operations
pub type MerkleResult<T> = Result<T, MerkleError>;
