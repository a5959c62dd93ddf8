//! Worker handlers - handshake and claim.

mod claim_worker;
mod create_worker;

pub use claim_worker::{ClaimWorkerCommand, ClaimWorkerHandler};
pub use create_worker::{
    CreateWorkerCommand, CreateWorkerHandler, CreateWorkerResult, HandshakeError,
};
