//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the monitor: worker tokens, subjects, sessions, time.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedSubject};
pub use errors::ValidationError;
pub use ids::{SessionId, SubjectId, WorkerId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
