//! Active connection set - admission control for streaming sessions.
//!
//! Membership is the only admission signal. A session is admitted by
//! receiving a [`ConnectionGuard`]; dropping the guard removes it again, so
//! every exit path of a session (clean close, transport error, panic
//! unwinding through the task) gives its slot back.
//!
//! # Thread Safety
//!
//! Uses a `std::sync::Mutex` rather than an async lock: critical sections
//! never await, and removal must be callable from `Drop`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::foundation::SessionId;

/// Bounded set of live streaming sessions.
#[derive(Debug)]
pub struct ActiveConnectionSet {
    sessions: Mutex<HashSet<SessionId>>,
    max_connections: usize,
}

impl ActiveConnectionSet {
    pub fn new(max_connections: usize) -> Self {
        Self {
            sessions: Mutex::new(HashSet::new()),
            max_connections,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<SessionId>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits `session` unless the set is full.
    ///
    /// The capacity check and the insert happen under one lock, so two
    /// sessions racing for the last slot cannot both get in.
    pub fn try_admit(self: &Arc<Self>, session: SessionId) -> Option<ConnectionGuard> {
        let mut sessions = self.lock();
        if sessions.len() >= self.max_connections {
            return None;
        }
        sessions.insert(session);
        Some(ConnectionGuard {
            set: Arc::clone(self),
            session,
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, session: &SessionId) -> bool {
        self.lock().contains(session)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    fn remove(&self, session: &SessionId) {
        self.lock().remove(session);
    }
}

/// Slot in the [`ActiveConnectionSet`], released on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    set: Arc<ActiveConnectionSet>,
    session: SessionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.set.remove(&self.session);
        tracing::debug!(session_id = %self.session, "Connection slot released");
    }
}
