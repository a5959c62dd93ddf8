//! Token ports - minting and validating time-bound access tokens.
//!
//! `TokenIssuer` turns a verified subject into an access/refresh pair.
//! `TokenValidator` is what the HTTP middleware uses to turn a Bearer token
//! back into an [`AuthenticatedSubject`].
//!
//! # Example
//!
//! ```ignore
//! let pair = issuer.issue(&subject).await?;
//! let who = validator.validate(&pair.access_token).await?;
//! assert_eq!(who.id, subject);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedSubject, SubjectId};

/// Access token plus the refresh token that can renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Mints tokens for verified subjects.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue a fresh pair for `subject`.
    async fn issue(&self, subject: &SubjectId) -> Result<TokenPair, AuthError>;

    /// Exchange a valid refresh token for a new pair.
    ///
    /// Returns `AuthError::WrongTokenType` when given an access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
}

/// Validates access tokens and extracts the subject.
///
/// # Contract
///
/// Implementations must:
/// - Validate the signature and expiry
/// - Return `AuthError::InvalidToken` for malformed or badly signed tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::WrongTokenType` for refresh tokens
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a raw access token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedSubject, AuthError>;
}
