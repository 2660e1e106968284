//! Settlement payloads and the anchoring seam
//!
//! Anchoring a closed session's final state on an authoritative record (a
//! blockchain transaction, in practice) happens outside this crate. The
//! [`SettlementAnchor`] trait is the seam a host plugs its client into.

use crate::error::ChannelResult;
use crate::session::{Allocations, SessionId};
use serde::{Deserialize, Serialize};
use solvency_primitives::Digest;
use std::sync::atomic::{AtomicU64, Ordering};

/// Final session state handed to the settlement collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPayload {
    pub session_id: SessionId,
    pub channel_id: Digest,
    pub allocations: Allocations,
    pub nonce: u64,
    pub state_hash: Digest,
}

/// Reference returned by the settlement collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReference {
    /// Transaction identifier or equivalent
    pub tx_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl SettlementReference {
    pub fn new(tx_ref: impl Into<String>) -> Self {
        Self {
            tx_ref: tx_ref.into(),
            block_number: None,
        }
    }

    pub fn with_block(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }
}

/// Strategy for anchoring a settlement payload
pub trait SettlementAnchor: Send + Sync {
    fn anchor(&self, payload: &SettlementPayload) -> ChannelResult<SettlementReference>;
}

/// Anchor that records nothing externally
///
/// The reference is derived from the payload's state hash, with a local
/// sequence standing in for a block number. Used by demos and tests.
#[derive(Debug, Default)]
pub struct LocalAnchor {
    next_block: AtomicU64,
}

impl LocalAnchor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettlementAnchor for LocalAnchor {
    fn anchor(&self, payload: &SettlementPayload) -> ChannelResult<SettlementReference> {
        let block = self.next_block.fetch_add(1, Ordering::SeqCst);
        Ok(SettlementReference::new(format!("local:{}", payload.state_hash)).with_block(block))
    }
}
