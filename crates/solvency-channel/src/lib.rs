//! Solvency Channel Sessions
//!
//! Off-chain balance sessions: many instant allocation updates, each advancing
//! a nonce and a deterministic state hash, followed by a single close and
//! settlement. A session's allocations export directly into the liability
//! leaf set.
//!
//! # Usage
//!
//! ```
//! use solvency_channel::{Allocations, ChannelConfig, SessionManager};
//! use solvency_primitives::{SignedAmount, UserId};
//!
//! let manager = SessionManager::in_memory(ChannelConfig::default());
//! let session = manager.create_session(["alice", "bob"]).unwrap();
//!
//! let mut update = Allocations::new();
//! update.insert(UserId::from("alice"), SignedAmount::from(10i64));
//! let session = manager.update_allocations(&session.id(), &update).unwrap();
//! assert_eq!(session.nonce(), 1);
//!
//! manager.close_session(&session.id()).unwrap();
//! let leaves = manager.export_allocations(&session.id()).unwrap();
//! assert_eq!(leaves.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod manager;
pub mod session;
pub mod settlement;
pub mod store;

pub use config::{ChannelConfig, NegativeBalancePolicy};
pub use error::{ChannelError, ChannelResult};
pub use export::{export_allocations, export_snapshot, export_to_ledger};
pub use manager::SessionManager;
pub use session::{
    compute_channel_id, compute_state_hash, Allocations, ChannelSession, ParticipantId,
    SessionId, SessionStatus, SessionTransition, TransitionKind,
};
pub use settlement::{LocalAnchor, SettlementAnchor, SettlementPayload, SettlementReference};
pub use store::{InMemorySessionStore, SessionStore};
