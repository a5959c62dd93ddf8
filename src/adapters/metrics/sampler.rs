//! Bounded blocking pool for metric collection.
//!
//! Providers block, so every sample runs on `spawn_blocking`. A semaphore
//! caps how many samples may be in flight at once; extra callers wait for a
//! permit instead of growing the blocking pool.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::metrics::{NetworkSnapshot, SystemSnapshot};
use crate::ports::{MetricsError, MetricsProvider};

/// Upper bound on concurrent samples regardless of core count.
pub const MAX_POOL_SIZE: usize = 16;

/// `min(cores * 2, 16)`.
pub fn default_pool_size() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores * 2).min(MAX_POOL_SIZE)
}

/// Runs a [`MetricsProvider`] off the event loop.
#[derive(Clone)]
pub struct MetricsSampler {
    provider: Arc<dyn MetricsProvider>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl MetricsSampler {
    pub fn new(provider: Arc<dyn MetricsProvider>) -> Self {
        Self::with_pool_size(provider, default_pool_size())
    }

    pub fn with_pool_size(provider: Arc<dyn MetricsProvider>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            provider,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.size
    }

    pub async fn system(&self) -> Result<SystemSnapshot, MetricsError> {
        self.run(|p| p.system_snapshot()).await
    }

    pub async fn network(&self) -> Result<NetworkSnapshot, MetricsError> {
        self.run(|p| p.network_snapshot()).await
    }

    async fn run<T, F>(&self, job: F) -> Result<T, MetricsError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn MetricsProvider) -> Result<T, MetricsError> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| MetricsError::Pool(e.to_string()))?;
        let provider = Arc::clone(&self.provider);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job(provider.as_ref())
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Metrics job did not complete");
            MetricsError::Pool(e.to_string())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::metrics::FixedMetricsProvider;
    use std::time::{Duration, Instant};

    #[test]
    fn default_pool_size_is_bounded() {
        let size = default_pool_size();
        assert!(size >= 1);
        assert!(size <= MAX_POOL_SIZE);
    }

    #[tokio::test]
    async fn samples_through_provider() {
        let provider = Arc::new(FixedMetricsProvider::new());
        let sampler = MetricsSampler::with_pool_size(provider.clone(), 2);

        let system = sampler.system().await.unwrap();
        let network = sampler.network().await.unwrap();

        assert_eq!(system.cpu.core_count, 4);
        assert_eq!(network.interfaces.len(), 1);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn provider_errors_pass_through() {
        let sampler = MetricsSampler::with_pool_size(
            Arc::new(FixedMetricsProvider::failing("no sensors")),
            1,
        );
        assert_eq!(
            sampler.system().await,
            Err(MetricsError::unavailable("no sensors"))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pool_of_one_serializes_samples() {
        let provider =
            Arc::new(FixedMetricsProvider::new().with_delay(Duration::from_millis(50)));
        let sampler = MetricsSampler::with_pool_size(provider, 1);

        let started = Instant::now();
        let (a, b) = tokio::join!(sampler.system(), sampler.system());
        a.unwrap();
        b.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn zero_pool_size_is_raised_to_one() {
        let sampler = MetricsSampler::with_pool_size(Arc::new(FixedMetricsProvider::new()), 0);
        assert_eq!(sampler.pool_size(), 1);
    }
}
