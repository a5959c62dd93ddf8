//! Client error types.

use thiserror::Error;

/// Why the client could not establish or keep a streaming session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Every reachability attempt failed.
    #[error("Server unreachable after {attempts} attempts")]
    Unreachable { attempts: u32 },

    /// Credentials or token rejected. Retrying with the same input cannot help.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The worker id was unknown, expired or already claimed.
    #[error("Invalid worker pairing: {0}")]
    InvalidPairing(String),

    /// The server refused the stream because it is full.
    #[error("Server is at full capacity")]
    Capacity,

    /// The server could not issue a worker.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with something this client does not understand.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    pub fn transport(message: impl ToString) -> Self {
        ClientError::Transport(message.to_string())
    }

    /// Fatal errors end the client; nothing further is attempted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::Unreachable { .. } | ClientError::Authentication(_)
        )
    }

    /// Errors that consume a connection attempt and back off.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Handshake(_) | ClientError::Transport(_))
    }
}
