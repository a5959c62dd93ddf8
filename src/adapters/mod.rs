//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to the outside world:
//! - `auth` - JWT token service and credential store
//! - `metrics` - Host metric providers and the bounded sampling pool
//! - `http` - REST endpoints (axum)
//! - `websocket` - Streaming sessions (axum WebSocket)

pub mod auth;
pub mod http;
pub mod metrics;
pub mod websocket;
