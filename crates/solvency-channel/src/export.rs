//! Session → ledger export
//!
//! Turns a session's allocation map into the leaf set consumed by
//! `LiabilityLedger` and `MerkleTree`. Valid in every session state; the leaves
//! come out in ascending key-byte order.

use crate::error::{ChannelError, ChannelResult};
use crate::session::ChannelSession;
use solvency_merkle::{LiabilityLedger, LiabilitySnapshot};
use solvency_primitives::Leaf;
use tracing::debug;

/// Snapshot allocations as leaves
///
/// A debt (negative allocation) is never turned into a liability leaf; it
/// fails with `NegativeAllocation` naming the participant.
pub fn export_allocations(session: &ChannelSession) -> ChannelResult<Vec<Leaf>> {
    let leaves = session
        .allocations()
        .iter()
        .map(|(participant, value)| {
            let amount = value
                .to_amount()
                .map_err(|_| ChannelError::NegativeAllocation {
                    participant: participant.to_string(),
                    amount: value.to_string(),
                })?;
            Ok(Leaf::new(participant.clone(), amount)?)
        })
        .collect::<ChannelResult<Vec<_>>>()?;

    debug!(
        session_id = %session.id(),
        nonce = session.nonce(),
        leaves = leaves.len(),
        "exported allocations"
    );
    Ok(leaves)
}

/// Export straight into a liability ledger
pub fn export_to_ledger(session: &ChannelSession) -> ChannelResult<LiabilityLedger> {
    Ok(LiabilityLedger::from_leaves(export_allocations(session)?)?)
}

/// Export as an interchange snapshot (JSON / CSV)
pub fn export_snapshot(session: &ChannelSession) -> ChannelResult<LiabilitySnapshot> {
    Ok(LiabilitySnapshot::new(export_allocations(session)?))
}
