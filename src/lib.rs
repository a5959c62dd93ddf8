//! psmonitor - Host metrics monitor
//!
//! Serves live system and network readings over WebSocket. A client
//! authenticates, performs a handshake that issues a short-lived worker id,
//! then opens a stream with that id and receives periodic JSON snapshots.
//! The crate also ships the reconnecting client that drives this flow.

pub mod adapters;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
pub mod telemetry;
