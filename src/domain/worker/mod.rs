//! Worker pairing domain.
//!
//! A worker is the token that ties an authenticated handshake request to the
//! streaming connection that follows it.

mod pairing;
mod registry;

pub use pairing::Worker;
pub use registry::{RegistryError, WorkerRegistry};
