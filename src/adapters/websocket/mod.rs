//! WebSocket adapters for live metric streaming.
//!
//! # Architecture
//!
//! ```text
//!   POST /worker ──▶ WorkerRegistry ◀── claim ── StreamingSession
//!                                                   │    ▲
//!                        ActiveConnectionSet ◀─slot─┘    │ snapshots
//!                                                        │
//!                                   MetricsSampler (bounded blocking pool)
//! ```
//!
//! # Components
//!
//! - [`messages`] - Wire protocol: acknowledgement, echo, close codes, feeds
//! - [`connections`] - Bounded set of live sessions with RAII slots
//! - [`session`] - The `Opening -> Streaming -> Closed` session driver
//! - [`handler`] - Axum upgrade handler and router

pub mod connections;
pub mod handler;
pub mod messages;
pub mod session;

pub use connections::{ActiveConnectionSet, ConnectionGuard};
pub use handler::{stream_routes, ws_handler, StreamState};
pub use messages::{connect_url, ConnectParams, Feed, CONNECTED_MESSAGE, CONNECT_PATH};
pub use session::{StreamingSession, WorkerLease};
