//! CreateWorkerHandler - Command handler for the handshake.
//!
//! Registers a fresh worker and schedules its eviction. Eviction goes through
//! the registry's conditional removal, so a worker claimed before the timer
//! fires is never touched by it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;

use crate::domain::foundation::{SubjectId, WorkerId};
use crate::domain::worker::{RegistryError, Worker, WorkerRegistry};

/// Reasons a handshake could not produce a worker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// No runtime is available to host the eviction timer.
    #[error("Eviction timer unavailable: no async runtime")]
    NoRuntime,
}

/// Command to create a new worker for an authenticated subscriber.
#[derive(Debug, Clone)]
pub struct CreateWorkerCommand {
    pub subscriber: SubjectId,
}

/// Result of a successful handshake.
#[derive(Debug, Clone)]
pub struct CreateWorkerResult {
    pub worker_id: WorkerId,
}

/// Handler for creating workers.
pub struct CreateWorkerHandler {
    registry: Arc<WorkerRegistry>,
    grace: Duration,
}

impl CreateWorkerHandler {
    pub fn new(registry: Arc<WorkerRegistry>, grace: Duration) -> Self {
        Self { registry, grace }
    }

    /// The eviction timer is spawned on the current Tokio runtime.
    pub fn handle(&self, cmd: CreateWorkerCommand) -> Result<CreateWorkerResult, HandshakeError> {
        let runtime = Handle::try_current().map_err(|_| HandshakeError::NoRuntime)?;

        // 1. Register the unclaimed worker
        let worker = Worker::new(cmd.subscriber);
        let worker_id = worker.id().clone();
        self.registry.insert(worker)?;

        // 2. Schedule eviction after the grace period
        let registry = Arc::clone(&self.registry);
        let evict_id = worker_id.clone();
        let grace = self.grace;
        let timer = runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(worker) = registry.evict_if_unclaimed(&evict_id) {
                tracing::info!(worker_id = %evict_id, "Unclaimed worker expired");
                worker.release();
            }
        });

        // 3. Let a claim cancel the timer
        self.registry.attach_expiry(&worker_id, timer.abort_handle());

        tracing::debug!(
            worker_id = %worker_id,
            grace_ms = self.grace.as_millis() as u64,
            "Worker created"
        );

        Ok(CreateWorkerResult { worker_id })
    }
}
