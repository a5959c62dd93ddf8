//! Metrics adapters.
//!
//! - `host` - Real host readings via `sysinfo`
//! - `fixed` - Canned readings for tests
//! - `sampler` - Bounded blocking pool that every async caller goes through

mod fixed;
mod host;
mod sampler;

pub use fixed::FixedMetricsProvider;
pub use host::{SysinfoMetricsProvider, DEFAULT_PROCESS_LIMIT};
pub use sampler::{default_pool_size, MetricsSampler, MAX_POOL_SIZE};
