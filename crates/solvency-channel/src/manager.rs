//! Session manager
//!
//! Owns a [`SessionStore`] and serializes mutations per session id. Each session
//! has its own lock, so updates to different sessions never wait on each other.
//! Calls to the settlement collaborator happen outside any session lock; a
//! per-session marker keeps a second caller from anchoring the same session.

use crate::config::ChannelConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::export;
use crate::session::{
    Allocations, ChannelSession, ParticipantId, SessionId, SessionStatus, SessionTransition,
};
use crate::settlement::{SettlementAnchor, SettlementReference};
use crate::store::{InMemorySessionStore, SessionStore};
use parking_lot::Mutex;
use solvency_merkle::LiabilityLedger;
use solvency_primitives::{Amount, Leaf};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// State guarded by a session's lock
#[derive(Debug, Default)]
struct SessionSlot {
    /// Set while the settlement anchor is running for this session
    settling: bool,
}

/// Coordinates session lifecycles on top of a store
pub struct SessionManager<S: SessionStore = InMemorySessionStore> {
    store: S,
    config: ChannelConfig,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<SessionSlot>>>>,
}

impl SessionManager<InMemorySessionStore> {
    /// Manager over a fresh in-memory store
    pub fn in_memory(config: ChannelConfig) -> Self {
        Self::new(InMemorySessionStore::new(), config)
    }
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S, config: ChannelConfig) -> Self {
        Self {
            store,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lock for an existing session; unknown ids never get an entry
    fn session_lock(&self, id: &SessionId) -> ChannelResult<Arc<Mutex<SessionSlot>>> {
        if let Some(lock) = self.locks.lock().get(id) {
            return Ok(Arc::clone(lock));
        }
        self.load(id)?;
        Ok(Arc::clone(self.locks.lock().entry(*id).or_default()))
    }

    fn load(&self, id: &SessionId) -> ChannelResult<ChannelSession> {
        self.store
            .get(id)?
            .ok_or(ChannelError::SessionNotFound { session_id: *id })
    }

    /// Apply `transition` to a copy of the stored session and persist it on success
    fn mutate<F>(&self, id: &SessionId, transition: F) -> ChannelResult<ChannelSession>
    where
        F: FnOnce(&mut ChannelSession) -> ChannelResult<()>,
    {
        let lock = self.session_lock(id)?;
        let slot = lock.lock();
        if slot.settling {
            return Err(ChannelError::SettlementInProgress { session_id: *id });
        }
        self.apply(id, transition)
    }

    /// Load, transform and persist; the caller holds the session lock
    fn apply<F>(&self, id: &SessionId, transition: F) -> ChannelResult<ChannelSession>
    where
        F: FnOnce(&mut ChannelSession) -> ChannelResult<()>,
    {
        let mut session = self.load(id)?;
        transition(&mut session)?;
        self.store.put(session.clone())?;
        Ok(session)
    }

    pub fn create_session<I, P>(&self, participants: I) -> ChannelResult<ChannelSession>
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        let session = ChannelSession::create(participants, self.config.clone())?;
        self.store.put(session.clone())?;
        Ok(session)
    }

    pub fn get_session(&self, id: &SessionId) -> ChannelResult<ChannelSession> {
        self.load(id)
    }

    pub fn update_allocations(
        &self,
        id: &SessionId,
        partial: &Allocations,
    ) -> ChannelResult<ChannelSession> {
        self.mutate(id, |session| session.update_allocations(partial))
    }

    pub fn close_session(&self, id: &SessionId) -> ChannelResult<ChannelSession> {
        self.mutate(id, ChannelSession::close)
    }

    pub fn settle_session(
        &self,
        id: &SessionId,
        reference: SettlementReference,
    ) -> ChannelResult<ChannelSession> {
        self.mutate(id, |session| session.settle(reference))
    }

    /// Anchor a closed session's payload, then record the reference
    ///
    /// Only one caller anchors a given session at a time; a concurrent call
    /// fails with `SettlementInProgress`. If anchoring fails the session stays
    /// `Closed` and the call can be retried.
    pub fn anchor_and_settle(
        &self,
        id: &SessionId,
        anchor: &dyn SettlementAnchor,
    ) -> ChannelResult<ChannelSession> {
        let lock = self.session_lock(id)?;
        let payload = {
            let mut slot = lock.lock();
            if slot.settling {
                return Err(ChannelError::SettlementInProgress { session_id: *id });
            }
            let session = self.load(id)?;
            if session.status() != SessionStatus::Closed {
                return Err(ChannelError::NotClosed {
                    session_id: *id,
                    status: session.status(),
                });
            }
            let payload = session.settlement_payload()?;
            slot.settling = true;
            payload
        };

        let anchored = anchor.anchor(&payload);

        let mut slot = lock.lock();
        slot.settling = false;
        let reference = anchored.map_err(|e| {
            warn!(session_id = %id, error = %e, "settlement anchoring failed");
            match e {
                ChannelError::SettlementFailed(_) => e,
                other => ChannelError::SettlementFailed(other.to_string()),
            }
        })?;
        self.apply(id, |session| session.settle(reference))
    }

    /// Open → Closed → anchored → Settled
    pub fn close_and_settle(
        &self,
        id: &SessionId,
        anchor: &dyn SettlementAnchor,
    ) -> ChannelResult<ChannelSession> {
        self.close_session(id)?;
        self.anchor_and_settle(id, anchor)
    }

    pub fn export_allocations(&self, id: &SessionId) -> ChannelResult<Vec<Leaf>> {
        export::export_allocations(&self.load(id)?)
    }

    pub fn export_to_ledger(&self, id: &SessionId) -> ChannelResult<LiabilityLedger> {
        export::export_to_ledger(&self.load(id)?)
    }

    pub fn list_sessions(&self) -> ChannelResult<Vec<ChannelSession>> {
        self.store.list()
    }

    pub fn history(&self, id: &SessionId) -> ChannelResult<Vec<SessionTransition>> {
        Ok(self.load(id)?.history().to_vec())
    }

    /// Sum of non-negative allocations across open sessions
    pub fn total_open_liabilities(&self) -> ChannelResult<Amount> {
        let total: Amount = self
            .store
            .list()?
            .iter()
            .filter(|s| s.status() == SessionStatus::Open)
            .map(ChannelSession::total_allocated)
            .sum();
        info!(total = %total, "computed open liabilities");
        Ok(total)
    }
}
