//! Epoch reports
//!
//! An [`EpochReport`] is the published outcome of one epoch: the liability
//! commitment, the reserves it was judged against, the solvency result and,
//! when the epoch is solvent, the prover's artifact.

use crate::error::{EvaluatorError, EvaluatorResult};
use crate::evaluator::{evaluate, SolvencyResult};
use crate::prover::{ProofArtifact, ProofGenerator, ProofRequest};
use crate::reserves::ReserveSnapshot;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use solvency_merkle::{verify_inclusion, InclusionProof, LiabilityCommitment};
use solvency_primitives::{Amount, SolvencyPublicInputs};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Published result of one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochReport {
    pub epoch_id: String,
    pub liabilities: LiabilityCommitment,
    pub reserves_total: Amount,
    pub solvency: SolvencyResult,
    pub public_inputs: SolvencyPublicInputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofArtifact>,
}

impl EpochReport {
    /// Verify a user's inclusion proof against this report's root
    pub fn verify_inclusion(&self, proof: &InclusionProof) -> bool {
        verify_inclusion(proof, &self.liabilities.root)
    }

    /// Check the report's parts agree with each other
    ///
    /// Public inputs must restate the commitment, the solvency result must be
    /// recomputable from the totals, and any artifact must be bound to the
    /// public inputs.
    pub fn is_consistent(&self) -> EvaluatorResult<bool> {
        if self.public_inputs != self.liabilities.public_inputs()
            || self.epoch_id != self.liabilities.epoch_id
        {
            return Ok(false);
        }
        if evaluate(&self.reserves_total, &self.liabilities.total) != self.solvency {
            return Ok(false);
        }
        match &self.proof {
            Some(artifact) => artifact.matches(&self.public_inputs),
            None => Ok(true),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> EvaluatorResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EvaluatorError::SerializationFailed(format!("JSON error: {}", e)))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> EvaluatorResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EvaluatorError::DeserializationFailed(format!("JSON error: {}", e)))
    }
}

/// Assembles an [`EpochReport`] from a commitment, reserves and an optional prover
pub struct ReportBuilder<'a> {
    liabilities: LiabilityCommitment,
    reserves_total: Option<Amount>,
    prover: Option<&'a dyn ProofGenerator>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(liabilities: LiabilityCommitment) -> Self {
        Self {
            liabilities,
            reserves_total: None,
            prover: None,
        }
    }

    /// Use a scanner snapshot; its epoch must match the commitment's
    pub fn reserves(mut self, snapshot: &ReserveSnapshot) -> EvaluatorResult<Self> {
        if snapshot.epoch_id != self.liabilities.epoch_id {
            return Err(EvaluatorError::EpochMismatch {
                liabilities: self.liabilities.epoch_id.clone(),
                reserves: snapshot.epoch_id.clone(),
            });
        }
        self.reserves_total = Some(snapshot.total()?);
        Ok(self)
    }

    /// Use a bare reserves total
    pub fn reserves_total(mut self, total: Amount) -> Self {
        self.reserves_total = Some(total);
        self
    }

    pub fn prover(mut self, prover: &'a dyn ProofGenerator) -> Self {
        self.prover = Some(prover);
        self
    }

    /// Evaluate solvency and, for a solvent epoch, request a proof
    ///
    /// Insolvent epochs still produce a report, without a proof.
    pub fn build(self) -> EvaluatorResult<EpochReport> {
        let reserves_total = self.reserves_total.ok_or_else(|| {
            EvaluatorError::InvalidReserves("no reserves supplied for the report".to_string())
        })?;

        let public_inputs = self.liabilities.public_inputs();
        public_inputs.validate()?;
        let solvency = evaluate(&reserves_total, &self.liabilities.total);

        let proof = match self.prover {
            Some(prover) if solvency.is_solvent => {
                let request = ProofRequest::new(
                    public_inputs.clone(),
                    reserves_total.clone(),
                    solvency.clone(),
                );
                Some(prover.generate(&request)?)
            }
            Some(_) => {
                warn!(
                    epoch_id = %self.liabilities.epoch_id,
                    "epoch is insolvent, report published without a proof"
                );
                None
            }
            None => None,
        };

        info!(
            epoch_id = %self.liabilities.epoch_id,
            is_solvent = solvency.is_solvent,
            has_proof = proof.is_some(),
            "built epoch report"
        );

        Ok(EpochReport {
            epoch_id: self.liabilities.epoch_id.clone(),
            liabilities: self.liabilities,
            reserves_total,
            solvency,
            public_inputs,
            proof,
        })
    }
}

/// Persistence seam for published reports
pub trait ReportStore: Send + Sync {
    fn get(&self, epoch_id: &str) -> EvaluatorResult<Option<EpochReport>>;

    /// Insert or replace the report for its epoch
    fn put(&self, report: EpochReport) -> EvaluatorResult<()>;

    /// All reports, ordered by epoch id
    fn list(&self) -> EvaluatorResult<Vec<EpochReport>>;

    fn require(&self, epoch_id: &str) -> EvaluatorResult<EpochReport> {
        self.get(epoch_id)?
            .ok_or_else(|| EvaluatorError::ReportNotFound {
                epoch_id: epoch_id.to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: RwLock<BTreeMap<String, EpochReport>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }
}

impl ReportStore for InMemoryReportStore {
    fn get(&self, epoch_id: &str) -> EvaluatorResult<Option<EpochReport>> {
        Ok(self.reports.read().get(epoch_id).cloned())
    }

    fn put(&self, report: EpochReport) -> EvaluatorResult<()> {
        self.reports.write().insert(report.epoch_id.clone(), report);
        Ok(())
    }

    fn list(&self) -> EvaluatorResult<Vec<EpochReport>> {
        Ok(self.reports.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::CommitmentOnlyProver;
    use crate::reserves::ReserveAddress;
    use solvency_merkle::LiabilityLedger;
    use solvency_primitives::UserId;

    fn ledger() -> LiabilityLedger {
        let mut ledger = LiabilityLedger::new();
        ledger.set_balance("alice", Amount::from(400u64)).unwrap();
        ledger.set_balance("bob", Amount::from(600u64)).unwrap();
        ledger
    }

    fn snapshot(epoch: &str, wei: u64) -> ReserveSnapshot {
        ReserveSnapshot::new(
            epoch,
            "sepolia",
            11155111,
            0,
            vec![ReserveAddress {
                address: "0xaaa".to_string(),
                balance_wei: Amount::from(wei),
            }],
        )
    }

    #[test]
    fn test_solvent_report_carries_proof() {
        let prover = CommitmentOnlyProver::new();
        let report = ReportBuilder::new(ledger().commit("e1").unwrap())
            .reserves(&snapshot("e1", 1100))
            .unwrap()
            .prover(&prover)
            .build()
            .unwrap();

        assert!(report.solvency.is_solvent);
        assert!(report.proof.is_some());
        assert!(report.is_consistent().unwrap());
    }

    #[test]
    fn test_insolvent_report_has_no_proof() {
        let prover = CommitmentOnlyProver::new();
        let report = ReportBuilder::new(ledger().commit("e1").unwrap())
            .reserves_total(Amount::from(999u64))
            .prover(&prover)
            .build()
            .unwrap();

        assert!(!report.solvency.is_solvent);
        assert!(report.proof.is_none());
        assert!(report.is_consistent().unwrap());
    }

    #[test]
    fn test_epoch_mismatch() {
        let result =
            ReportBuilder::new(ledger().commit("e1").unwrap()).reserves(&snapshot("e2", 1));
        assert!(matches!(result, Err(EvaluatorError::EpochMismatch { .. })));
    }

    #[test]
    fn test_missing_reserves() {
        let result = ReportBuilder::new(ledger().commit("e1").unwrap()).build();
        assert!(matches!(result, Err(EvaluatorError::InvalidReserves(_))));
    }

    #[test]
    fn test_tampered_report_is_inconsistent() {
        let mut report = ReportBuilder::new(ledger().commit("e1").unwrap())
            .reserves_total(Amount::from(2000u64))
            .build()
            .unwrap();
        report.solvency.is_solvent = false;
        assert!(!report.is_consistent().unwrap());
    }

    #[test]
    fn test_user_inclusion_against_report() {
        let ledger = ledger();
        let tree = ledger.build_tree().unwrap();
        let report = ReportBuilder::new(ledger.commit("e1").unwrap())
            .reserves_total(Amount::from(1000u64))
            .build()
            .unwrap();

        let proof = tree.prove_inclusion(&UserId::from("bob")).unwrap();
        assert!(report.verify_inclusion(&proof));
    }

    #[test]
    fn test_report_json_reload() {
        let prover = CommitmentOnlyProver::new();
        let report = ReportBuilder::new(ledger().commit("e1").unwrap())
            .reserves_total(Amount::from(1000u64))
            .prover(&prover)
            .build()
            .unwrap();
        let reloaded = EpochReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, report);
    }

    #[test]
    fn test_store() {
        let store = InMemoryReportStore::new();
        assert!(matches!(
            store.require("e1"),
            Err(EvaluatorError::ReportNotFound { .. })
        ));

        for epoch in ["e2", "e1"] {
            let report = ReportBuilder::new(ledger().commit(epoch).unwrap())
                .reserves_total(Amount::from(1u64))
                .build()
                .unwrap();
            store.put(report).unwrap();
        }

        assert_eq!(store.len(), 2);
        assert_eq!(store.require("e1").unwrap().epoch_id, "e1");
        let epochs: Vec<_> = store.list().unwrap().into_iter().map(|r| r.epoch_id).collect();
        assert_eq!(epochs, vec!["e1", "e2"]);
    }
}
