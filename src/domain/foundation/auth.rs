//! Authentication types for the domain layer.
//!
//! These types describe an authenticated principal extracted from an access
//! token. They have **no external dependencies**: the JWT adapter and the
//! credential store populate them through the ports in [`crate::ports`].

use super::SubjectId;
use thiserror::Error;

/// Principal extracted from a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    /// Opaque subject identifier (the `sub` claim).
    pub id: SubjectId,
}

impl AuthenticatedSubject {
    /// Creates a new authenticated subject.
    pub fn new(id: SubjectId) -> Self {
        Self { id }
    }
}

/// Authentication errors that can occur during login or token validation.
///
/// These errors are **domain-centric**: they describe what went wrong
/// from the application's perspective, not the signing library's.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Username/password pair was rejected by the credential store.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// A refresh token was presented where an access token is required, or vice versa.
    #[error("Wrong token type")]
    WrongTokenType,

    /// Token could not be minted or the store could not be consulted.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the caller should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::WrongTokenType
        )
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_displays_correctly() {
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid or expired token");
        assert_eq!(AuthError::TokenExpired.to_string(), "Token expired");
        assert_eq!(
            AuthError::service_unavailable("signing failed").to_string(),
            "Auth service unavailable: signing failed"
        );
    }

    #[test]
    fn auth_error_requires_reauthentication_for_token_errors() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(AuthError::WrongTokenType.requires_reauthentication());
        assert!(!AuthError::InvalidCredentials.requires_reauthentication());
        assert!(!AuthError::service_unavailable("").requires_reauthentication());
    }

    #[test]
    fn auth_error_is_transient_only_for_service_errors() {
        assert!(AuthError::service_unavailable("timeout").is_transient());
        assert!(!AuthError::InvalidCredentials.is_transient());
        assert!(!AuthError::TokenExpired.is_transient());
    }
}
