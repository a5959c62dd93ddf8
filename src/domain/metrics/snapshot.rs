//! Point-in-time host metric snapshots.
//!
//! These are the wire shapes pushed over the stream and served by the
//! point-in-time endpoints. Top-level keys of [`SystemSnapshot`] are `cpu`,
//! `mem`, `disk`, `uptime` and `processes`.

use serde::{Deserialize, Serialize};

/// CPU utilisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    pub usage_percent: f32,
    pub core_count: usize,
    pub frequency_mhz: u64,
    pub per_core_percent: Vec<f32>,
}

/// Physical memory and swap, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f32,
    pub swap_total: u64,
    pub swap_used: u64,
}

/// Disk usage aggregated across mounted filesystems, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f32,
}

/// Host uptime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UptimeStats {
    pub seconds: u64,
    pub boot_time: u64,
}

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub pid: u32,
    pub name: String,
    pub memory_bytes: u64,
    pub cpu_percent: f32,
}

/// Snapshot pushed on the `system` feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu: CpuStats,
    pub mem: MemoryStats,
    pub disk: DiskStats,
    pub uptime: UptimeStats,
    pub processes: Vec<ProcessStats>,
}

impl SystemSnapshot {
    /// True when the provider produced nothing worth sending.
    pub fn is_empty(&self) -> bool {
        self.cpu.core_count == 0 && self.mem.total == 0 && self.processes.is_empty()
    }
}

/// Counters for a single network interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    pub name: String,
    pub mac_address: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub errors_in: u64,
    pub errors_out: u64,
}

/// Snapshot pushed on the `network` feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub interfaces: Vec<InterfaceStats>,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

impl NetworkSnapshot {
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Builds a snapshot and its totals from per-interface rows.
    pub fn from_interfaces(interfaces: Vec<InterfaceStats>) -> Self {
        let bytes_received = interfaces.iter().map(|i| i.bytes_received).sum();
        let bytes_sent = interfaces.iter().map(|i| i.bytes_sent).sum();
        Self {
            interfaces,
            bytes_received,
            bytes_sent,
        }
    }
}

/// Percentage helper that never divides by zero.
pub fn percent_of(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        0.0
    } else {
        ((part as f64 / whole as f64) * 100.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_snapshot_serializes_with_expected_top_level_keys() {
        let snapshot = SystemSnapshot {
            cpu: CpuStats {
                usage_percent: 12.5,
                core_count: 4,
                ..Default::default()
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        let object = value.as_object().unwrap();
        for key in ["cpu", "mem", "disk", "uptime", "processes"] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(object.len(), 5);
    }

    #[test]
    fn default_system_snapshot_is_empty() {
        assert!(SystemSnapshot::default().is_empty());
    }

    #[test]
    fn network_totals_sum_interfaces() {
        let row = |name: &str, rx, tx| InterfaceStats {
            name: name.to_string(),
            mac_address: "00:00:00:00:00:00".to_string(),
            bytes_received: rx,
            bytes_sent: tx,
            packets_received: 0,
            packets_sent: 0,
            errors_in: 0,
            errors_out: 0,
        };

        let snapshot = NetworkSnapshot::from_interfaces(vec![row("eth0", 100, 10), row("lo", 5, 5)]);
        assert_eq!(snapshot.bytes_received, 105);
        assert_eq!(snapshot.bytes_sent, 15);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn percent_of_handles_zero_total() {
        assert_eq!(percent_of(10, 0), 0.0);
        assert_eq!(percent_of(50, 200), 25.0);
    }
}
