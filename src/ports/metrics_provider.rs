//! MetricsProvider port - where host snapshots come from.
//!
//! Implementations may block (reading `/proc`, sleeping for a CPU sample
//! window, ...). Callers on the event loop must never call them directly;
//! they go through [`MetricsSampler`](crate::adapters::metrics::MetricsSampler),
//! which runs them on a bounded blocking pool.
//!
//! # Contract
//!
//! Implementations must:
//! - Be safe to call repeatedly and concurrently from several pool threads
//! - Return `MetricsError` rather than panicking when a source is unreadable

use thiserror::Error;

use crate::domain::metrics::{NetworkSnapshot, SystemSnapshot};

/// Errors raised while collecting a snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricsError {
    /// The underlying source could not be read.
    #[error("Metrics source unavailable: {0}")]
    Unavailable(String),

    /// The blocking pool refused or lost the job.
    #[error("Metrics pool failure: {0}")]
    Pool(String),
}

impl MetricsError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Produces structured snapshots of system state.
pub trait MetricsProvider: Send + Sync {
    /// CPU, memory, disk, uptime and the process table.
    fn system_snapshot(&self) -> Result<SystemSnapshot, MetricsError>;

    /// Per-interface network counters.
    fn network_snapshot(&self) -> Result<NetworkSnapshot, MetricsError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Failing;

    impl MetricsProvider for Failing {
        fn system_snapshot(&self) -> Result<SystemSnapshot, MetricsError> {
            Err(MetricsError::unavailable("no /proc"))
        }

        fn network_snapshot(&self) -> Result<NetworkSnapshot, MetricsError> {
            Err(MetricsError::unavailable("no /proc"))
        }
    }

    #[test]
    fn provider_is_object_safe_and_send_sync() {
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<Arc<dyn MetricsProvider>>();

        let provider: Arc<dyn MetricsProvider> = Arc::new(Failing);
        assert_eq!(
            provider.system_snapshot().unwrap_err().to_string(),
            "Metrics source unavailable: no /proc"
        );
    }
}
