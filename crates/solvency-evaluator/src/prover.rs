//! Proof-generation seam
//!
//! The zero-knowledge prover runs outside this workspace. It is reached through
//! [`ProofGenerator`]; [`CommitmentOnlyProver`] is the in-process stand-in that
//! binds the public inputs without proving anything about them.

use crate::error::{EvaluatorError, EvaluatorResult};
use crate::evaluator::{evaluate, SolvencyResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use solvency_primitives::{Amount, Digest, SolvencyPublicInputs};
use tracing::{info, warn};

/// Domain separator for commitment-only artifacts
pub const DOMAIN_COMMITMENT_ONLY: &[u8] = b"SOLVENCY_COMMITMENT_ONLY_V1";

/// Proof system label written by [`CommitmentOnlyProver`]
pub const COMMITMENT_ONLY_SYSTEM: &str = "commitment-only";

/// Everything a prover needs for one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub public_inputs: SolvencyPublicInputs,
    pub reserves_total: Amount,
    pub solvency: SolvencyResult,
}

impl ProofRequest {
    pub fn new(
        public_inputs: SolvencyPublicInputs,
        reserves_total: Amount,
        solvency: SolvencyResult,
    ) -> Self {
        Self {
            public_inputs,
            reserves_total,
            solvency,
        }
    }
}

/// Opaque proof bytes plus the public inputs they are bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    pub system: String,
    pub proof_b64: String,
    pub public_inputs_hash: Digest,
}

impl ProofArtifact {
    pub fn new(system: impl Into<String>, proof_bytes: &[u8], public_inputs_hash: Digest) -> Self {
        Self {
            system: system.into(),
            proof_b64: base64::engine::general_purpose::STANDARD.encode(proof_bytes),
            public_inputs_hash,
        }
    }

    /// Decode the base64 proof bytes
    pub fn proof_bytes(&self) -> EvaluatorResult<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.proof_b64)
            .map_err(|e| EvaluatorError::DeserializationFailed(format!("base64 error: {}", e)))
    }

    /// Check the artifact is bound to `public_inputs`
    pub fn matches(&self, public_inputs: &SolvencyPublicInputs) -> EvaluatorResult<bool> {
        Ok(public_inputs.compute_hash()? == self.public_inputs_hash)
    }
}

/// External proof-generation strategy
pub trait ProofGenerator: Send + Sync {
    fn generate(&self, request: &ProofRequest) -> EvaluatorResult<ProofArtifact>;
}

/// Binds the public inputs hash and reserves total; proves nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitmentOnlyProver;

impl CommitmentOnlyProver {
    pub fn new() -> Self {
        Self
    }

    /// `SHA256(domain || public_inputs_hash || reserves_be32)`
    pub fn commitment(
        public_inputs_hash: &Digest,
        reserves_total: &Amount,
    ) -> EvaluatorResult<Digest> {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(public_inputs_hash.as_bytes());
        data.extend_from_slice(&reserves_total.to_be_bytes32()?);
        Ok(Digest::sha256_with_domain(DOMAIN_COMMITMENT_ONLY, &data))
    }
}

impl ProofGenerator for CommitmentOnlyProver {
    fn generate(&self, request: &ProofRequest) -> EvaluatorResult<ProofArtifact> {
        let liabilities = request.public_inputs.total()?;
        if evaluate(&request.reserves_total, &liabilities) != request.solvency {
            return Err(EvaluatorError::ProofGenerationFailed(
                "solvency result does not match the request totals".to_string(),
            ));
        }
        if !request.solvency.is_solvent {
            warn!(
                epoch_id = %request.public_inputs.epoch_id,
                "refusing to produce a proof for an insolvent epoch"
            );
            return Err(EvaluatorError::Insolvent {
                reserves: request.reserves_total.to_string(),
                liabilities: liabilities.to_string(),
            });
        }

        let public_inputs_hash = request.public_inputs.compute_hash()?;
        let commitment = Self::commitment(&public_inputs_hash, &request.reserves_total)?;
        info!(
            epoch_id = %request.public_inputs.epoch_id,
            public_inputs_hash = %public_inputs_hash,
            "generated commitment-only artifact"
        );
        Ok(ProofArtifact::new(
            COMMITMENT_ONLY_SYSTEM,
            commitment.as_bytes(),
            public_inputs_hash,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(reserves: u64, liabilities: u64) -> ProofRequest {
        let public_inputs = SolvencyPublicInputs::new(
            &Digest::from_bytes([7u8; 32]),
            &Amount::from(liabilities),
            "epoch-1",
        );
        let solvency = evaluate(&Amount::from(reserves), &Amount::from(liabilities));
        ProofRequest::new(public_inputs, Amount::from(reserves), solvency)
    }

    #[test]
    fn test_solvent_request_produces_artifact() {
        let req = request(1100, 1000);
        let artifact = CommitmentOnlyProver::new().generate(&req).unwrap();

        assert_eq!(artifact.system, COMMITMENT_ONLY_SYSTEM);
        assert!(artifact.matches(&req.public_inputs).unwrap());
        let bytes = artifact.proof_bytes().unwrap();
        let expected =
            CommitmentOnlyProver::commitment(&artifact.public_inputs_hash, &req.reserves_total)
                .unwrap();
        assert_eq!(bytes, expected.as_bytes().to_vec());
    }

    #[test]
    fn test_insolvent_request_refused() {
        let result = CommitmentOnlyProver::new().generate(&request(999, 1000));
        assert!(matches!(result, Err(EvaluatorError::Insolvent { .. })));
    }

    #[test]
    fn test_inconsistent_request_refused() {
        let mut req = request(1100, 1000);
        req.reserves_total = Amount::from(5000u64);
        assert!(matches!(
            CommitmentOnlyProver::new().generate(&req),
            Err(EvaluatorError::ProofGenerationFailed(_))
        ));
    }

    #[test]
    fn test_forged_judgment_refused() {
        let mut req = request(900, 1000);
        req.solvency.is_solvent = true;
        assert!(matches!(
            CommitmentOnlyProver::new().generate(&req),
            Err(EvaluatorError::ProofGenerationFailed(_))
        ));
    }

    #[test]
    fn test_artifact_bound_to_inputs() {
        let req = request(1100, 1000);
        let artifact = CommitmentOnlyProver::new().generate(&req).unwrap();
        let other = SolvencyPublicInputs::new(
            &Digest::from_bytes([7u8; 32]),
            &Amount::from(1000u64),
            "epoch-2",
        );
        assert!(!artifact.matches(&other).unwrap());
    }

    #[test]
    fn test_bad_base64_rejected() {
        let mut artifact = CommitmentOnlyProver::new().generate(&request(2, 1)).unwrap();
        artifact.proof_b64 = "***".to_string();
        assert!(artifact.proof_bytes().is_err());
    }
}
