//! Metric snapshot value types.

mod snapshot;

pub use snapshot::{
    percent_of, CpuStats, DiskStats, InterfaceStats, MemoryStats, NetworkSnapshot, ProcessStats,
    SystemSnapshot, UptimeStats,
};
