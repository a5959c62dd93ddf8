//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Transport adapters translate requests into commands and results back into
//! responses; they never touch the registry or token service directly.

pub mod handlers;

pub use handlers::{
    // Auth handlers
    AuthenticateCommand, AuthenticateHandler, RefreshTokenCommand, RefreshTokenHandler,
    // Worker handlers
    ClaimWorkerCommand, ClaimWorkerHandler, CreateWorkerCommand, CreateWorkerHandler,
    CreateWorkerResult, HandshakeError,
};
