//! ClaimWorkerHandler - binds a streaming session to a pending worker.

use std::sync::Arc;

use crate::domain::foundation::{SessionId, WorkerId};
use crate::domain::session::SessionError;
use crate::domain::worker::{Worker, WorkerRegistry};

/// Command to claim a worker for a session.
#[derive(Debug, Clone)]
pub struct ClaimWorkerCommand {
    /// Raw id as supplied by the client.
    pub worker_id: String,
    pub session_id: SessionId,
}

/// Handler for claiming workers.
///
/// Claiming is one atomic removal from the registry. Of any number of
/// concurrent claims for one id, at most one receives the worker.
pub struct ClaimWorkerHandler {
    registry: Arc<WorkerRegistry>,
}

impl ClaimWorkerHandler {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    pub fn handle(&self, cmd: ClaimWorkerCommand) -> Result<Worker, SessionError> {
        let worker_id =
            WorkerId::parse(cmd.worker_id).map_err(|_| SessionError::InvalidWorker)?;

        let mut worker = self.registry.claim(&worker_id).ok_or_else(|| {
            tracing::info!(worker_id = %worker_id, "Worker id not claimable");
            SessionError::InvalidWorker
        })?;

        if !worker.bind(cmd.session_id) {
            // Unreachable through the registry: workers leave it unbound.
            worker.release();
            return Err(SessionError::InvalidWorker);
        }

        tracing::info!(
            worker_id = %worker_id,
            subscriber = %worker.subscriber(),
            session_id = %cmd.session_id,
            "Worker claimed"
        );

        Ok(worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SubjectId;

    fn registry_with_worker() -> (Arc<WorkerRegistry>, WorkerId) {
        let registry = Arc::new(WorkerRegistry::new(8));
        let worker = Worker::new(SubjectId::new("subscriber-1").unwrap());
        let id = worker.id().clone();
        registry.insert(worker).unwrap();
        (registry, id)
    }

    fn claim(handler: &ClaimWorkerHandler, id: &str) -> Result<Worker, SessionError> {
        handler.handle(ClaimWorkerCommand {
            worker_id: id.to_string(),
            session_id: SessionId::new(),
        })
    }

    #[test]
    fn claim_binds_session_and_removes_worker() {
        let (registry, id) = registry_with_worker();
        let handler = ClaimWorkerHandler::new(Arc::clone(&registry));
        let session_id = SessionId::new();

        let worker = handler
            .handle(ClaimWorkerCommand {
                worker_id: id.as_str().to_string(),
                session_id,
            })
            .unwrap();

        assert_eq!(worker.bound_handler(), Some(session_id));
        assert!(!registry.contains(&id));
    }

    #[test]
    fn second_claim_is_invalid() {
        let (registry, id) = registry_with_worker();
        let handler = ClaimWorkerHandler::new(registry);

        assert!(claim(&handler, id.as_str()).is_ok());
        assert_eq!(
            claim(&handler, id.as_str()).unwrap_err(),
            SessionError::InvalidWorker
        );
    }

    #[test]
    fn unknown_and_blank_ids_are_invalid() {
        let (registry, _) = registry_with_worker();
        let handler = ClaimWorkerHandler::new(Arc::clone(&registry));

        assert_eq!(
            claim(&handler, "never-issued").unwrap_err(),
            SessionError::InvalidWorker
        );
        assert_eq!(claim(&handler, "  ").unwrap_err(), SessionError::InvalidWorker);
        assert_eq!(registry.len(), 1);
    }
}
