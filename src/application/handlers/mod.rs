//! Application handlers.
//!
//! Command handlers that orchestrate domain operations through ports.

pub mod auth;
pub mod worker;

pub use auth::{AuthenticateCommand, AuthenticateHandler, RefreshTokenCommand, RefreshTokenHandler};
pub use worker::{
    ClaimWorkerCommand, ClaimWorkerHandler, CreateWorkerCommand, CreateWorkerHandler,
    CreateWorkerResult, HandshakeError,
};
