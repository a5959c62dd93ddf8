//! Reconnecting monitor client.
//!
//! ```text
//! ClientSessionManager (psmonitor-client thread)
//!   └─ ClientSession::safe_connect
//!        probe ─▶ authenticate ─▶ handshake ─▶ StreamConnection::open
//!          │  unreachable / transport / handshake failure
//!          └─ sleep base * 2^attempt, retry up to max_attempts
//!
//! StreamConnection (psmonitor-stream thread)
//!   └─ frames ─▶ SnapshotConsumer (e.g. SharedSnapshot)
//! ```

pub mod api;
pub mod backoff;
pub mod error;
pub mod manager;
pub mod session;
pub mod stream;

pub use api::{HttpServerApi, Incoming, IncomingStream, ServerApi, WorkerTicket};
pub use backoff::Backoff;
pub use error::ClientError;
pub use manager::ClientSessionManager;
pub use session::ClientSession;
pub use stream::{SharedSnapshot, Snapshot, SnapshotConsumer, StreamConnection};
