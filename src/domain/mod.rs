//! Domain layer containing the monitor's core types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, auth, errors)
//! - `worker` - Worker tokens and the registry that pairs handshakes with streams
//! - `session` - Streaming session and server lifecycle state machines
//! - `metrics` - Host metric snapshot value types

pub mod foundation;
pub mod metrics;
pub mod session;
pub mod worker;
