//! Server assembly and lifecycle.
//!
//! - [`app`] - Shared state and router construction
//! - [`lifecycle`] - Dedicated-thread runtime with blocking start/stop/restart

pub mod app;
pub mod lifecycle;

pub use app::{build_router, AppState};
pub use lifecycle::{LifecycleError, ServerDeps, ServerHandle, ServerLifecycleManager};
