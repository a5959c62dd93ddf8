//! Streaming session error types.

use thiserror::Error;

/// Message sent to a client rejected for capacity.
pub const CAPACITY_MESSAGE: &str = "Server is at full capacity. Please try again later.";

/// Message sent to a client whose worker id cannot be claimed.
pub const INVALID_WORKER_MESSAGE: &str = "Invalid worker id";

/// Reasons a streaming session ends other than a clean close.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Active connection set is full; no worker was consumed.
    #[error("{}", CAPACITY_MESSAGE)]
    Capacity,

    /// Worker id was never issued, already claimed, or expired.
    #[error("{}", INVALID_WORKER_MESSAGE)]
    InvalidWorker,

    /// The transport closed or failed. Expected; never escalated.
    #[error("Transport closed: {0}")]
    Transport(String),

    /// The metrics provider failed; the session cannot continue without data.
    #[error("Metrics provider failed: {0}")]
    Provider(String),
}

impl SessionError {
    pub fn transport(message: impl Into<String>) -> Self {
        SessionError::Transport(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        SessionError::Provider(message.into())
    }

    /// Short machine-readable code used in close frames and logs.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Capacity => "CAPACITY",
            SessionError::InvalidWorker => "INVALID_WORKER",
            SessionError::Transport(_) => "TRANSPORT",
            SessionError::Provider(_) => "PROVIDER",
        }
    }

    /// Expected disconnects are swallowed rather than reported.
    pub fn is_expected_disconnect(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_match_wire_text() {
        assert_eq!(SessionError::Capacity.to_string(), CAPACITY_MESSAGE);
        assert_eq!(SessionError::InvalidWorker.to_string(), INVALID_WORKER_MESSAGE);
    }

    #[test]
    fn only_transport_errors_are_expected() {
        assert!(SessionError::transport("reset").is_expected_disconnect());
        assert!(!SessionError::provider("boom").is_expected_disconnect());
        assert!(!SessionError::Capacity.is_expected_disconnect());
    }
}
