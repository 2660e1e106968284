//! Solvency Proof - liability commitments and solvency judgment
//!
//! A custodian commits to every user liability with a Merkle tree, measures its
//! reserves, and publishes whether the reserves cover the committed total.
//! Users check their own balance against the published root offline.
//!
//! # Crates
//!
//! - `solvency-primitives`: hashing, amounts, leaves, proof public inputs
//! - `solvency-merkle`: Merkle tree, inclusion proofs, liability ledger
//! - `solvency-channel`: off-chain balance sessions and their export
//! - `solvency-evaluator`: solvency judgment, reserves, epoch reports
//!
//! # Example
//!
//! ```
//! use solvency_proof::channel::{ChannelConfig, SessionManager};
//! use solvency_proof::evaluator::ReportBuilder;
//! use solvency_proof::primitives::{Amount, SignedAmount, UserId};
//!
//! let manager = SessionManager::in_memory(ChannelConfig::default());
//! let id = manager.create_session(["alice", "bob"]).unwrap().id();
//! let update = [
//!     (UserId::from("alice"), SignedAmount::from(600i64)),
//!     (UserId::from("bob"), SignedAmount::from(400i64)),
//! ]
//! .into_iter()
//! .collect();
//! manager.update_allocations(&id, &update).unwrap();
//! manager.close_session(&id).unwrap();
//!
//! let ledger = manager.export_to_ledger(&id).unwrap();
//! let report = ReportBuilder::new(ledger.commit("epoch-1").unwrap())
//!     .reserves_total(Amount::from(1100u64))
//!     .build()
//!     .unwrap();
//! assert!(report.solvency.is_solvent);
//! ```

// Re-export sub-crates
pub use solvency_channel as channel;
pub use solvency_evaluator as evaluator;
pub use solvency_merkle as merkle;
pub use solvency_primitives as primitives;
