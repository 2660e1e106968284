//! Error types for off-chain session operations

use crate::session::{SessionId, SessionStatus};
use solvency_merkle::MerkleError;
use solvency_primitives::AmountError;
use thiserror::Error;

/// Errors that can occur during session operations
///
/// A failed transition never mutates the session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChannelError {
    /// Allocation update on a session that is no longer open
    #[error("Session {session_id} is {status} and cannot accept allocation updates")]
    SessionClosed {
        session_id: SessionId,
        status: SessionStatus,
    },

    /// Close requested on a session that is not open
    #[error("Session {session_id} is already {status}")]
    AlreadyClosed {
        session_id: SessionId,
        status: SessionStatus,
    },

    /// Settlement requested on a session that is not closed
    #[error("Session {session_id} is {status}, expected closed")]
    NotClosed {
        session_id: SessionId,
        status: SessionStatus,
    },

    /// No session with this id exists in the store
    #[error("Session {session_id} not found")]
    SessionNotFound { session_id: SessionId },

    /// A session needs at least one participant
    #[error("Session requires at least one participant")]
    NoParticipants,

    /// Participant list exceeds the configured limit
    #[error("Session has {count} participants, maximum is {max}")]
    TooManyParticipants { count: usize, max: usize },

    /// Allocation for a key outside the participant set
    #[error("'{participant}' is not a participant of session {session_id}")]
    UnknownParticipant {
        session_id: SessionId,
        participant: String,
    },

    /// Negative allocation rejected by policy, or exported as a liability
    #[error("Negative allocation {amount} for '{participant}'")]
    NegativeAllocation { participant: String, amount: String },

    /// Nonce cannot be incremented further
    #[error("Nonce overflow: cannot increment further")]
    NonceOverflow,

    /// Amount failed validation
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Building the exported ledger failed
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// The settlement collaborator failed to anchor the payload
    #[error("Settlement anchoring failed: {0}")]
    SettlementFailed(String),

    /// Another caller is already anchoring this session
    #[error("Session {session_id} is already being settled")]
    SettlementInProgress { session_id: SessionId },

    /// Session store failure
    #[error("Session store error: {0}")]
    Store(String),
}

/// Result type for session operations
pub type ChannelResult<T> = Result<T, ChannelError>;
