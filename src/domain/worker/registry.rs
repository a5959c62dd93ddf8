//! WorkerRegistry - the table of pending handshake tokens.
//!
//! The registry is owned by the server instance and injected into the
//! handshake endpoint and the streaming sessions. Entries leave the table in
//! exactly two ways, both through [`WorkerRegistry::remove_if`]:
//!
//! ```text
//! create_worker ──insert──▶ [ pending ] ──claim (remove if present)──▶ session
//!                               │
//!                               └──evict (remove if present and unclaimed)──▶ dropped
//! ```
//!
//! Because both paths go through the same locked removal, a claim and an
//! eviction can never both succeed for the same worker.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::task::AbortHandle;

use crate::domain::foundation::WorkerId;

use super::Worker;

/// Errors raised when registering a worker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Too many unclaimed workers are outstanding.
    #[error("Too many pending workers (limit {capacity})")]
    Full { capacity: usize },
}

/// Shared table of unclaimed workers keyed by id.
#[derive(Debug)]
pub struct WorkerRegistry {
    workers: Mutex<HashMap<WorkerId, Worker>>,
    capacity: usize,
}

impl WorkerRegistry {
    /// Creates an empty registry holding at most `capacity` pending workers.
    pub fn new(capacity: usize) -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WorkerId, Worker>> {
        // Every critical section leaves the map consistent, so a poisoned
        // lock still guards valid data.
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a freshly created worker.
    pub fn insert(&self, worker: Worker) -> Result<(), RegistryError> {
        let mut workers = self.lock();
        if workers.len() >= self.capacity {
            return Err(RegistryError::Full {
                capacity: self.capacity,
            });
        }
        workers.insert(worker.id().clone(), worker);
        Ok(())
    }

    /// Hands the worker its eviction timer. Returns false if it is already gone.
    pub fn attach_expiry(&self, id: &WorkerId, handle: AbortHandle) -> bool {
        match self.lock().get_mut(id) {
            Some(worker) => {
                worker.attach_expiry(handle);
                true
            }
            None => {
                handle.abort();
                false
            }
        }
    }

    /// The single removal primitive: removes `id` only if `predicate` holds.
    pub fn remove_if<F>(&self, id: &WorkerId, predicate: F) -> Option<Worker>
    where
        F: FnOnce(&Worker) -> bool,
    {
        let mut workers = self.lock();
        let matches = workers.get(id).map(predicate).unwrap_or(false);
        if matches {
            workers.remove(id)
        } else {
            None
        }
    }

    /// Atomically pops the worker so exactly one claimant can own it.
    pub fn claim(&self, id: &WorkerId) -> Option<Worker> {
        self.remove_if(id, |_| true)
    }

    /// Removes the worker if it is still present and unclaimed.
    pub fn evict_if_unclaimed(&self, id: &WorkerId) -> Option<Worker> {
        self.remove_if(id, |worker| !worker.is_claimed())
    }

    pub fn contains(&self, id: &WorkerId) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of pending workers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SubjectId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    fn worker() -> Worker {
        Worker::new(SubjectId::new("subject-1").unwrap())
    }

    #[test]
    fn insert_then_claim_removes_worker() {
        let registry = WorkerRegistry::default();
        let w = worker();
        let id = w.id().clone();

        registry.insert(w).unwrap();
        assert!(registry.contains(&id));

        let claimed = registry.claim(&id).expect("worker should be claimable");
        assert_eq!(claimed.id(), &id);
        assert!(!registry.contains(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn second_claim_fails() {
        let registry = WorkerRegistry::default();
        let w = worker();
        let id = w.id().clone();
        registry.insert(w).unwrap();

        assert!(registry.claim(&id).is_some());
        assert!(registry.claim(&id).is_none());
    }

    #[test]
    fn claim_unknown_id_returns_none() {
        let registry = WorkerRegistry::default();
        let unknown = WorkerId::parse("never-issued").unwrap();
        assert!(registry.claim(&unknown).is_none());
    }

    #[test]
    fn evict_removes_unclaimed_worker() {
        let registry = WorkerRegistry::default();
        let w = worker();
        let id = w.id().clone();
        registry.insert(w).unwrap();

        assert!(registry.evict_if_unclaimed(&id).is_some());
        assert!(!registry.contains(&id));
    }

    #[test]
    fn evict_after_claim_is_noop() {
        let registry = WorkerRegistry::default();
        let w = worker();
        let id = w.id().clone();
        registry.insert(w).unwrap();

        let claimed = registry.claim(&id);
        assert!(claimed.is_some());
        assert!(registry.evict_if_unclaimed(&id).is_none());
    }

    #[test]
    fn remove_if_leaves_entry_when_predicate_fails() {
        let registry = WorkerRegistry::default();
        let w = worker();
        let id = w.id().clone();
        registry.insert(w).unwrap();

        assert!(registry.remove_if(&id, |_| false).is_none());
        assert!(registry.contains(&id));
    }

    #[test]
    fn insert_rejects_when_full() {
        let registry = WorkerRegistry::new(1);
        registry.insert(worker()).unwrap();

        let err = registry.insert(worker()).unwrap_err();
        assert_eq!(err, RegistryError::Full { capacity: 1 });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_claims_have_exactly_one_winner() {
        let registry = Arc::new(WorkerRegistry::default());
        let w = worker();
        let id = w.id().clone();
        registry.insert(w).unwrap();

        let claimants = 16;
        let barrier = Arc::new(Barrier::new(claimants));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..claimants)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                let id = id.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if registry.claim(&id).is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn claim_and_evict_race_has_exactly_one_winner() {
        for _ in 0..64 {
            let registry = Arc::new(WorkerRegistry::default());
            let w = worker();
            let id = w.id().clone();
            registry.insert(w).unwrap();
            let barrier = Arc::new(Barrier::new(2));

            let claim = {
                let (registry, barrier, id) = (registry.clone(), barrier.clone(), id.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.claim(&id).is_some()
                })
            };
            let evict = {
                let (registry, barrier, id) = (registry.clone(), barrier.clone(), id.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.evict_if_unclaimed(&id).is_some()
                })
            };

            let claimed = claim.join().unwrap();
            let evicted = evict.join().unwrap();
            assert!(claimed ^ evicted, "claim and evict must not both succeed");
        }
    }
}
