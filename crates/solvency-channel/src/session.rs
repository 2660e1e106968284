//! Off-chain balance session state machine
//!
//! A session moves through three states:
//! - Open: allocation updates are accepted, each one advancing the nonce by 1
//! - Closed: the final state is frozen and can be handed to settlement
//! - Settled: an external settlement reference has been recorded
//!
//! Every version of the session is committed to by
//! `stateHash = hash(0x02, [session_id, nonce_be8, key_0, value_0, key_1, value_1, ..])`
//! with allocations in ascending key-byte order and each value encoded as a
//! sign byte followed by its 32-byte big-endian magnitude. Transitions are
//! all-or-nothing: a failed call leaves every field untouched.

use crate::config::{ChannelConfig, NegativeBalancePolicy};
use crate::error::{ChannelError, ChannelResult};
use crate::export;
use crate::settlement::{SettlementPayload, SettlementReference};
use serde::{Deserialize, Serialize};
use solvency_primitives::{
    hash_fields, Amount, Digest, Leaf, SignedAmount, UserId, DOMAIN_CHANNEL_ID,
    DOMAIN_SESSION_STATE,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Participants are identified the same way as liability holders
pub type ParticipantId = UserId;

/// Partial allocation map applied by one update
pub type Allocations = BTreeMap<ParticipantId, SignedAmount>;

/// Unique session identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
    Settled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
            SessionStatus::Settled => "settled",
        };
        f.write_str(s)
    }
}

/// Kind of a recorded transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Create,
    Update,
    Close,
    Settle,
}

/// One entry of a session's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTransition {
    pub kind: TransitionKind,
    pub nonce: u64,
    pub state_hash: Digest,
    /// Unix epoch milliseconds
    pub timestamp: u64,
}

/// Current time in Unix epoch milliseconds
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Compute the state commitment for `(id, nonce, allocations)`
pub fn compute_state_hash(
    id: &SessionId,
    nonce: u64,
    allocations: &Allocations,
) -> ChannelResult<Digest> {
    let nonce_bytes = nonce.to_be_bytes();
    let encoded: Vec<[u8; 33]> = allocations
        .values()
        .map(SignedAmount::to_signed_bytes33)
        .collect::<Result<_, _>>()?;

    let mut fields: Vec<&[u8]> = Vec::with_capacity(2 + allocations.len() * 2);
    fields.push(id.as_bytes());
    fields.push(&nonce_bytes);
    for (key, value) in allocations.keys().zip(encoded.iter()) {
        fields.push(key.as_bytes());
        fields.push(value);
    }
    Ok(hash_fields(DOMAIN_SESSION_STATE, &fields))
}

/// Derive the channel identifier from the session's creation parameters
pub fn compute_channel_id(
    id: &SessionId,
    participants: &BTreeSet<ParticipantId>,
    created_at: u64,
) -> Digest {
    let created_at_bytes = created_at.to_be_bytes();
    let mut fields: Vec<&[u8]> = Vec::with_capacity(participants.len() + 2);
    fields.push(id.as_bytes());
    fields.extend(participants.iter().map(UserId::as_bytes));
    fields.push(&created_at_bytes);
    hash_fields(DOMAIN_CHANNEL_ID, &fields)
}

/// A versioned off-chain ledger of balance allocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSession {
    id: SessionId,
    channel_id: Digest,
    participants: BTreeSet<ParticipantId>,
    allocations: Allocations,
    nonce: u64,
    state_hash: Digest,
    status: SessionStatus,
    created_at: u64,
    updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settlement_ref: Option<SettlementReference>,
    history: Vec<SessionTransition>,
    config: ChannelConfig,
}

impl ChannelSession {
    /// Open a new session with a fresh id and the current time
    pub fn create<I, P>(participants: I, config: ChannelConfig) -> ChannelResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        Self::create_with_id(SessionId::new_v4(), participants, config, now_millis())
    }

    /// Open a session with caller-chosen id and creation time
    pub fn create_with_id<I, P>(
        id: SessionId,
        participants: I,
        config: ChannelConfig,
        created_at: u64,
    ) -> ChannelResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        let participants: BTreeSet<ParticipantId> =
            participants.into_iter().map(Into::into).collect();
        if participants.is_empty() {
            return Err(ChannelError::NoParticipants);
        }
        if participants.len() > config.max_participants {
            return Err(ChannelError::TooManyParticipants {
                count: participants.len(),
                max: config.max_participants,
            });
        }

        let allocations = Allocations::new();
        let state_hash = compute_state_hash(&id, 0, &allocations)?;
        let channel_id = compute_channel_id(&id, &participants, created_at);

        info!(
            session_id = %id,
            channel_id = %channel_id,
            participants = participants.len(),
            "opened session"
        );

        Ok(Self {
            id,
            channel_id,
            participants,
            allocations,
            nonce: 0,
            state_hash,
            status: SessionStatus::Open,
            created_at,
            updated_at: created_at,
            closed_at: None,
            settlement_ref: None,
            history: vec![SessionTransition {
                kind: TransitionKind::Create,
                nonce: 0,
                state_hash,
                timestamp: created_at,
            }],
            config,
        })
    }

    /// Merge `partial` into the allocations (last write wins) and advance the nonce
    pub fn update_allocations(&mut self, partial: &Allocations) -> ChannelResult<()> {
        self.update_allocations_at(partial, now_millis())
    }

    pub fn update_allocations_at(&mut self, partial: &Allocations, now: u64) -> ChannelResult<()> {
        if self.status != SessionStatus::Open {
            warn!(session_id = %self.id, status = %self.status, "update rejected");
            return Err(ChannelError::SessionClosed {
                session_id: self.id,
                status: self.status,
            });
        }
        let nonce = self.nonce.checked_add(1).ok_or(ChannelError::NonceOverflow)?;

        for (participant, amount) in partial {
            if self.config.restrict_to_participants && !self.participants.contains(participant) {
                return Err(ChannelError::UnknownParticipant {
                    session_id: self.id,
                    participant: participant.to_string(),
                });
            }
            if amount.is_negative()
                && self.config.negative_balances == NegativeBalancePolicy::Reject
            {
                return Err(ChannelError::NegativeAllocation {
                    participant: participant.to_string(),
                    amount: amount.to_string(),
                });
            }
        }

        let mut allocations = self.allocations.clone();
        for (participant, amount) in partial {
            allocations.insert(participant.clone(), amount.clone());
        }
        // Fails on values wider than 256 bits, before anything is committed.
        let state_hash = compute_state_hash(&self.id, nonce, &allocations)?;

        self.allocations = allocations;
        self.nonce = nonce;
        self.state_hash = state_hash;
        self.updated_at = now;
        self.record(TransitionKind::Update, now);

        debug!(
            session_id = %self.id,
            nonce,
            changed = partial.len(),
            state_hash = %state_hash,
            "allocations updated"
        );
        Ok(())
    }

    /// Open → Closed
    pub fn close(&mut self) -> ChannelResult<()> {
        self.close_at(now_millis())
    }

    pub fn close_at(&mut self, now: u64) -> ChannelResult<()> {
        if self.status != SessionStatus::Open {
            warn!(session_id = %self.id, status = %self.status, "close rejected");
            return Err(ChannelError::AlreadyClosed {
                session_id: self.id,
                status: self.status,
            });
        }
        self.status = SessionStatus::Closed;
        self.closed_at = Some(now);
        self.updated_at = now;
        self.record(TransitionKind::Close, now);

        info!(
            session_id = %self.id,
            total_updates = self.nonce,
            state_hash = %self.state_hash,
            "session closed"
        );
        Ok(())
    }

    /// Closed → Settled, recording the external reference
    pub fn settle(&mut self, reference: SettlementReference) -> ChannelResult<()> {
        self.settle_at(reference, now_millis())
    }

    pub fn settle_at(&mut self, reference: SettlementReference, now: u64) -> ChannelResult<()> {
        if self.status != SessionStatus::Closed {
            warn!(session_id = %self.id, status = %self.status, "settle rejected");
            return Err(ChannelError::NotClosed {
                session_id: self.id,
                status: self.status,
            });
        }
        info!(session_id = %self.id, tx_ref = %reference.tx_ref, "session settled");
        self.status = SessionStatus::Settled;
        self.settlement_ref = Some(reference);
        self.updated_at = now;
        self.record(TransitionKind::Settle, now);
        Ok(())
    }

    /// Snapshot allocations as liability leaves, ordered by key bytes
    pub fn export_allocations(&self) -> ChannelResult<Vec<Leaf>> {
        export::export_allocations(self)
    }

    /// Final state handed to the settlement collaborator (once closed)
    pub fn settlement_payload(&self) -> ChannelResult<SettlementPayload> {
        if self.status == SessionStatus::Open {
            return Err(ChannelError::NotClosed {
                session_id: self.id,
                status: self.status,
            });
        }
        Ok(SettlementPayload {
            session_id: self.id,
            channel_id: self.channel_id,
            allocations: self.allocations.clone(),
            nonce: self.nonce,
            state_hash: self.state_hash,
        })
    }

    /// Recompute the state hash and compare it with the stored one
    pub fn verify_state_hash(&self) -> bool {
        matches!(
            compute_state_hash(&self.id, self.nonce, &self.allocations),
            Ok(hash) if hash == self.state_hash
        )
    }

    /// Sum of the non-negative allocations
    pub fn total_allocated(&self) -> Amount {
        self.allocations
            .values()
            .filter_map(|value| value.to_amount().ok())
            .sum()
    }

    fn record(&mut self, kind: TransitionKind, timestamp: u64) {
        self.history.push(SessionTransition {
            kind,
            nonce: self.nonce,
            state_hash: self.state_hash,
            timestamp,
        });
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn channel_id(&self) -> Digest {
        self.channel_id
    }

    pub fn participants(&self) -> &BTreeSet<ParticipantId> {
        &self.participants
    }

    pub fn allocations(&self) -> &Allocations {
        &self.allocations
    }

    pub fn allocation(&self, participant: &ParticipantId) -> Option<&SignedAmount> {
        self.allocations.get(participant)
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn state_hash(&self) -> Digest {
        self.state_hash
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    pub fn closed_at(&self) -> Option<u64> {
        self.closed_at
    }

    pub fn settlement_ref(&self) -> Option<&SettlementReference> {
        self.settlement_ref.as_ref()
    }

    pub fn history(&self) -> &[SessionTransition] {
        &self.history
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}
