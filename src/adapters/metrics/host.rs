//! Host metrics read through the `sysinfo` crate.

use std::sync::Mutex;

use sysinfo::{Disks, Networks, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::domain::metrics::{
    percent_of, CpuStats, DiskStats, InterfaceStats, MemoryStats, NetworkSnapshot, ProcessStats,
    SystemSnapshot, UptimeStats,
};
use crate::ports::{MetricsError, MetricsProvider};

/// Default number of process rows in a system snapshot.
pub const DEFAULT_PROCESS_LIMIT: usize = 10;

/// Reusable `sysinfo::System` behind a lock so CPU deltas have a baseline.
pub struct SysinfoMetricsProvider {
    sys: Mutex<System>,
    process_limit: usize,
}

impl SysinfoMetricsProvider {
    pub fn new() -> Self {
        Self::with_process_limit(DEFAULT_PROCESS_LIMIT)
    }

    /// Keeps the `limit` processes with the highest resident memory.
    pub fn with_process_limit(limit: usize) -> Self {
        let mut sys = System::new_all();
        // CPU usage is a delta between two refreshes.
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        Self {
            sys: Mutex::new(sys),
            process_limit: limit,
        }
    }

    fn cpu(sys: &System) -> CpuStats {
        let cpus = sys.cpus();
        CpuStats {
            usage_percent: sys.global_cpu_usage(),
            core_count: cpus.len(),
            frequency_mhz: cpus.first().map(|c| c.frequency()).unwrap_or(0),
            per_core_percent: cpus.iter().map(|c| c.cpu_usage()).collect(),
        }
    }

    fn memory(sys: &System) -> MemoryStats {
        let total = sys.total_memory();
        let used = sys.used_memory();
        MemoryStats {
            total,
            used,
            available: sys.available_memory(),
            percent: percent_of(used, total),
            swap_total: sys.total_swap(),
            swap_used: sys.used_swap(),
        }
    }

    fn disk() -> DiskStats {
        let disks = Disks::new_with_refreshed_list();
        let (total, free) = disks.list().iter().fold((0u64, 0u64), |(total, free), d| {
            (
                total.saturating_add(d.total_space()),
                free.saturating_add(d.available_space()),
            )
        });
        let used = total.saturating_sub(free);
        DiskStats {
            total,
            used,
            free,
            percent: percent_of(used, total),
        }
    }

    fn processes(&self, sys: &System) -> Vec<ProcessStats> {
        let mut rows: Vec<ProcessStats> = sys
            .processes()
            .values()
            .map(|p| ProcessStats {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                memory_bytes: p.memory(),
                cpu_percent: p.cpu_usage(),
            })
            .collect();
        rows.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes));
        rows.truncate(self.process_limit);
        rows
    }
}

impl Default for SysinfoMetricsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for SysinfoMetricsProvider {
    fn system_snapshot(&self) -> Result<SystemSnapshot, MetricsError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| MetricsError::unavailable("system sampler lock poisoned"))?;

        sys.refresh_cpu_usage();
        sys.refresh_memory();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        Ok(SystemSnapshot {
            cpu: Self::cpu(&sys),
            mem: Self::memory(&sys),
            disk: Self::disk(),
            uptime: UptimeStats {
                seconds: System::uptime(),
                boot_time: System::boot_time(),
            },
            processes: self.processes(&sys),
        })
    }

    fn network_snapshot(&self) -> Result<NetworkSnapshot, MetricsError> {
        let networks = Networks::new_with_refreshed_list();
        let mut interfaces: Vec<InterfaceStats> = networks
            .list()
            .iter()
            .map(|(name, data)| InterfaceStats {
                name: name.clone(),
                mac_address: data.mac_address().to_string(),
                bytes_received: data.total_received(),
                bytes_sent: data.total_transmitted(),
                packets_received: data.total_packets_received(),
                packets_sent: data.total_packets_transmitted(),
                errors_in: data.total_errors_on_received(),
                errors_out: data.total_errors_on_transmitted(),
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(NetworkSnapshot::from_interfaces(interfaces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_snapshot_has_finite_percentages() {
        let provider = SysinfoMetricsProvider::with_process_limit(3);
        let snapshot = provider.system_snapshot().unwrap();

        assert!(snapshot.cpu.usage_percent.is_finite());
        assert!(snapshot.mem.percent.is_finite());
        assert!(snapshot.disk.percent.is_finite());
        assert!(snapshot.processes.len() <= 3);
    }

    #[test]
    fn processes_are_ordered_by_memory() {
        let provider = SysinfoMetricsProvider::new();
        let snapshot = provider.system_snapshot().unwrap();

        assert!(snapshot
            .processes
            .windows(2)
            .all(|w| w[0].memory_bytes >= w[1].memory_bytes));
    }

    #[test]
    fn network_totals_match_interfaces() {
        let provider = SysinfoMetricsProvider::with_process_limit(0);
        let snapshot = provider.network_snapshot().unwrap();

        let rx: u64 = snapshot.interfaces.iter().map(|i| i.bytes_received).sum();
        assert_eq!(snapshot.bytes_received, rx);
    }
}
