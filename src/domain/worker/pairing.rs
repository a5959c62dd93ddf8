//! Worker - a short-lived pairing between a handshake and a future stream.

use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::domain::foundation::{SessionId, SubjectId, WorkerId};

/// A pending or bound pairing token.
///
/// While a worker sits in the [`WorkerRegistry`](super::WorkerRegistry) it is
/// unclaimed. Claiming pops it out of the registry and hands ownership to the
/// streaming session, which binds itself exactly once via [`Worker::bind`].
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    subscriber: SubjectId,
    bound_handler: Option<SessionId>,
    created_at: Instant,
    expiry: Option<AbortHandle>,
}

impl Worker {
    /// Creates an unclaimed worker with a fresh random id.
    pub fn new(subscriber: SubjectId) -> Self {
        Self {
            id: WorkerId::generate(),
            subscriber,
            bound_handler: None,
            created_at: Instant::now(),
            expiry: None,
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Principal that requested this worker.
    pub fn subscriber(&self) -> &SubjectId {
        &self.subscriber
    }

    /// Session that claimed this worker, if any.
    pub fn bound_handler(&self) -> Option<SessionId> {
        self.bound_handler
    }

    pub fn is_claimed(&self) -> bool {
        self.bound_handler.is_some()
    }

    /// Attaches the scheduled eviction task so a claim can cancel it.
    pub(crate) fn attach_expiry(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.expiry.replace(handle) {
            previous.abort();
        }
    }

    /// Binds the worker to a streaming session.
    ///
    /// Only the first bind takes effect; returns false if already bound.
    /// Binding cancels the pending eviction timer.
    pub fn bind(&mut self, session: SessionId) -> bool {
        if self.bound_handler.is_some() {
            return false;
        }
        self.bound_handler = Some(session);
        if let Some(expiry) = self.expiry.take() {
            expiry.abort();
        }
        true
    }

    /// Releases the worker after its session closed or it was evicted.
    ///
    /// A released worker is gone for good; it is never put back in the registry.
    pub fn release(mut self) {
        if let Some(expiry) = self.expiry.take() {
            expiry.abort();
        }
        tracing::debug!(
            worker_id = %self.id,
            subscriber = %self.subscriber,
            session_id = ?self.bound_handler,
            age_ms = self.created_at.elapsed().as_millis() as u64,
            "Worker released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn subject() -> SubjectId {
        SubjectId::new("subject-1").unwrap()
    }

    #[test]
    fn new_worker_is_unclaimed() {
        let worker = Worker::new(subject());
        assert!(!worker.is_claimed());
        assert_eq!(worker.subscriber().as_str(), "subject-1");
        assert!(worker.bound_handler().is_none());
    }

    #[test]
    fn bind_sets_handler_exactly_once() {
        let mut worker = Worker::new(subject());
        let first = SessionId::new();
        let second = SessionId::new();

        assert!(worker.bind(first));
        assert!(!worker.bind(second));
        assert_eq!(worker.bound_handler(), Some(first));
    }

    #[tokio::test]
    async fn bind_aborts_pending_expiry() {
        let mut worker = Worker::new(subject());
        let timer = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        worker.attach_expiry(timer.abort_handle());

        worker.bind(SessionId::new());

        let result = timer.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
