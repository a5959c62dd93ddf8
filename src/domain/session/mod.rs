//! Streaming session domain: states and failure taxonomy.

mod errors;
mod state;

pub use errors::{SessionError, CAPACITY_MESSAGE, INVALID_WORKER_MESSAGE};
pub use state::{LifecycleState, SessionState};
