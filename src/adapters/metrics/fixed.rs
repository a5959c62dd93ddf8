//! Canned metrics provider for tests and demos.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::metrics::{
    CpuStats, InterfaceStats, MemoryStats, NetworkSnapshot, SystemSnapshot, UptimeStats,
};
use crate::ports::{MetricsError, MetricsProvider};

/// Returns the same snapshots on every call and counts how often it was asked.
pub struct FixedMetricsProvider {
    system: SystemSnapshot,
    network: NetworkSnapshot,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedMetricsProvider {
    pub fn new() -> Self {
        Self {
            system: SystemSnapshot {
                cpu: CpuStats {
                    usage_percent: 7.5,
                    core_count: 4,
                    frequency_mhz: 2400,
                    per_core_percent: vec![5.0, 10.0, 7.5, 7.5],
                },
                mem: MemoryStats {
                    total: 8 << 30,
                    used: 2 << 30,
                    available: 6 << 30,
                    percent: 25.0,
                    swap_total: 0,
                    swap_used: 0,
                },
                uptime: UptimeStats {
                    seconds: 3600,
                    boot_time: 1_700_000_000,
                },
                ..Default::default()
            },
            network: NetworkSnapshot::from_interfaces(vec![InterfaceStats {
                name: "eth0".to_string(),
                mac_address: "02:42:ac:11:00:02".to_string(),
                bytes_received: 1024,
                bytes_sent: 512,
                packets_received: 8,
                packets_sent: 4,
                errors_in: 0,
                errors_out: 0,
            }]),
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with `MetricsError::Unavailable(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Block the calling thread for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, value: &T) -> Result<T, MetricsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match &self.failure {
            Some(message) => Err(MetricsError::unavailable(message.clone())),
            None => Ok(value.clone()),
        }
    }
}

impl Default for FixedMetricsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for FixedMetricsProvider {
    fn system_snapshot(&self) -> Result<SystemSnapshot, MetricsError> {
        self.answer(&self.system)
    }

    fn network_snapshot(&self) -> Result<NetworkSnapshot, MetricsError> {
        self.answer(&self.network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_calls() {
        let provider = FixedMetricsProvider::new();
        provider.system_snapshot().unwrap();
        provider.network_snapshot().unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn failing_provider_reports_unavailable() {
        let provider = FixedMetricsProvider::failing("sensor offline");
        assert_eq!(
            provider.system_snapshot(),
            Err(MetricsError::unavailable("sensor offline"))
        );
    }
}
