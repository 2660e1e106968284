//! Solvency Evaluation
//!
//! Judges reserves against committed liabilities and packages the outcome of an
//! epoch for publication.
//!
//! # Usage
//!
//! ```
//! use solvency_evaluator::{CommitmentOnlyProver, ReportBuilder};
//! use solvency_merkle::LiabilityLedger;
//! use solvency_primitives::Amount;
//!
//! let mut ledger = LiabilityLedger::new();
//! ledger.set_balance("alice", Amount::from(600u64)).unwrap();
//! ledger.set_balance("bob", Amount::from(400u64)).unwrap();
//!
//! let prover = CommitmentOnlyProver::new();
//! let report = ReportBuilder::new(ledger.commit("epoch-1").unwrap())
//!     .reserves_total(Amount::from(1100u64))
//!     .prover(&prover)
//!     .build()
//!     .unwrap();
//! assert!(report.solvency.is_solvent);
//! ```

pub mod error;
pub mod evaluator;
pub mod prover;
pub mod report;
pub mod reserves;

pub use error::{EvaluatorError, EvaluatorResult};
pub use evaluator::{evaluate, SolvencyEvaluator, SolvencyResult};
pub use prover::{
    CommitmentOnlyProver, ProofArtifact, ProofGenerator, ProofRequest, COMMITMENT_ONLY_SYSTEM,
};
pub use report::{EpochReport, InMemoryReportStore, ReportBuilder, ReportStore};
pub use reserves::{ReserveAddress, ReserveSnapshot};
