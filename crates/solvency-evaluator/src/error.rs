//! Error types for solvency evaluation and report packaging

use solvency_merkle::MerkleError;
use solvency_primitives::{AmountError, PublicInputsError};
use thiserror::Error;

/// Errors that can occur while evaluating solvency or packaging a report
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// Amount failed validation
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Reserve snapshot is malformed
    #[error("Invalid reserve snapshot: {0}")]
    InvalidReserves(String),

    /// Declared reserve total disagrees with the per-address sum
    #[error("Reserve total mismatch: declared {declared}, sum of addresses {computed}")]
    ReserveTotalMismatch { declared: String, computed: String },

    /// Reserve and liability epochs differ
    #[error("Epoch mismatch: liabilities for '{liabilities}', reserves for '{reserves}'")]
    EpochMismatch {
        liabilities: String,
        reserves: String,
    },

    /// Proof requested for an insolvent result
    #[error("Insolvent: reserves {reserves} < liabilities {liabilities}")]
    Insolvent {
        reserves: String,
        liabilities: String,
    },

    /// Public inputs are malformed
    #[error("Invalid public inputs: {0}")]
    PublicInputs(#[from] PublicInputsError),

    /// Liability commitment failed
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// Proof generation failed
    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    /// No report stored for this epoch
    #[error("Report for epoch '{epoch_id}' not found")]
    ReportNotFound { epoch_id: String },

    /// Serialization error
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization error
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

/// Result type for evaluator operations
pub type EvaluatorResult<T> = Result<T, EvaluatorError>;
