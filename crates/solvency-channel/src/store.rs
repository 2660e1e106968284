//! Session persistence seam

use crate::error::ChannelResult;
use crate::session::{ChannelSession, SessionId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Repository of sessions
///
/// Implementations must be safe to share between threads; the manager
/// serializes mutations of one session but different sessions may be written
/// concurrently.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &SessionId) -> ChannelResult<Option<ChannelSession>>;

    /// Insert or replace the session with the same id
    fn put(&self, session: ChannelSession) -> ChannelResult<()>;

    /// All sessions, oldest first
    fn list(&self) -> ChannelResult<Vec<ChannelSession>>;
}

/// In-memory store backed by a `RwLock<HashMap>`
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, ChannelSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &SessionId) -> ChannelResult<Option<ChannelSession>> {
        Ok(self.sessions.read().get(id).cloned())
    }

    fn put(&self, session: ChannelSession) -> ChannelResult<()> {
        self.sessions.write().insert(session.id(), session);
        Ok(())
    }

    fn list(&self) -> ChannelResult<Vec<ChannelSession>> {
        let mut sessions: Vec<ChannelSession> = self.sessions.read().values().cloned().collect();
        sessions.sort_by_key(|s| (s.created_at(), s.id()));
        Ok(sessions)
    }
}
