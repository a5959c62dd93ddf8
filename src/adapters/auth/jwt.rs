//! HS256 JWT adapter for issuing and validating access tokens.
//!
//! This adapter implements both the `TokenIssuer` and `TokenValidator`
//! ports with a single shared secret. Tokens carry:
//!
//! - **Subject (sub)**: the id returned by the credential store
//! - **Expiry (exp)** / **Issued at (iat)**: Unix seconds
//! - **Type (type)**: `access` or `refresh`; one is never accepted as the other
//!
//! # Example
//!
//! ```ignore
//! use psmonitor::adapters::auth::{JwtConfig, JwtTokenService};
//!
//! let service = JwtTokenService::new(JwtConfig::new(secret));
//! let pair = service.issue(&subject).await?;
//! let who = service.validate(&pair.access_token).await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedSubject, SubjectId, Timestamp};
use crate::ports::{TokenIssuer, TokenPair, TokenValidator};

/// Configuration for the JWT adapter.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC signing secret.
    pub secret: SecretString,

    /// Access token lifetime in minutes.
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days.
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    /// Create a configuration with default lifetimes (15 minutes / 7 days).
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        }
    }

    /// Set custom token lifetimes.
    pub fn with_ttls(mut self, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        self.access_ttl_minutes = access_ttl_minutes;
        self.refresh_ttl_days = refresh_ttl_days;
        self
    }
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims carried by both token types.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Issues and validates HS256 tokens.
pub struct JwtTokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let encoding_key = EncodingKey::from_secret(secret);
        let decoding_key = DecodingKey::from_secret(secret);
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn sign(&self, subject: &str, token_type: TokenType) -> Result<String, AuthError> {
        let now = Timestamp::now();
        let exp = match token_type {
            TokenType::Access => now.plus_minutes(self.config.access_ttl_minutes),
            TokenType::Refresh => now.plus_days(self.config.refresh_ttl_days),
        };
        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.as_unix_secs(),
            iat: now.as_unix_secs(),
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::service_unavailable(format!("Failed to sign token: {}", e))
        })
    }

    fn pair_for(&self, subject: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(subject, TokenType::Access)?,
            refresh_token: self.sign(subject, TokenType::Refresh)?,
            expires_in: self.config.access_ttl_minutes * 60,
        })
    }

    /// Decode and check a token of the expected type.
    fn decode_claims(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        if data.claims.token_type != expected {
            tracing::debug!(
                expected = ?expected,
                actual = ?data.claims.token_type,
                "Token type mismatch"
            );
            return Err(AuthError::WrongTokenType);
        }

        Ok(data.claims)
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenService {
    async fn issue(&self, subject: &SubjectId) -> Result<TokenPair, AuthError> {
        self.pair_for(subject.as_str())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.decode_claims(refresh_token, TokenType::Refresh)?;
        self.pair_for(&claims.sub)
    }
}

#[async_trait]
impl TokenValidator for JwtTokenService {
    async fn validate(&self, token: &str) -> Result<AuthenticatedSubject, AuthError> {
        let claims = self.decode_claims(token, TokenType::Access)?;
        let id = SubjectId::new(claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedSubject::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-hmac-secret-that-is-long-enough-for-tests";

    fn service() -> JwtTokenService {
        JwtTokenService::new(JwtConfig::new(SecretString::new(SECRET.to_string())))
    }

    fn subject() -> SubjectId {
        SubjectId::new("5b0a7c1e-subject").unwrap()
    }

    fn forge(secret: &str, token_type: TokenType, exp_offset_secs: i64) -> String {
        let now = Timestamp::now().as_unix_secs();
        let claims = Claims {
            sub: "5b0a7c1e-subject".to_string(),
            exp: now + exp_offset_secs,
            iat: now,
            token_type,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn issued_access_token_validates_to_subject() {
        let service = service();
        let pair = service.issue(&subject()).await.unwrap();

        let who = service.validate(&pair.access_token).await.unwrap();
        assert_eq!(who.id, subject());
        assert_eq!(pair.expires_in, 15 * 60);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let service = service();
        let pair = service.issue(&subject()).await.unwrap();

        let result = service.validate(&pair.refresh_token).await;
        assert_eq!(result, Err(AuthError::WrongTokenType));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let service = service();
        let pair = service.issue(&subject()).await.unwrap();

        let result = service.refresh(&pair.access_token).await;
        assert_eq!(result, Err(AuthError::WrongTokenType));
    }

    #[tokio::test]
    async fn refresh_yields_new_valid_pair() {
        let service = service();
        let pair = service.issue(&subject()).await.unwrap();

        let renewed = service.refresh(&pair.refresh_token).await.unwrap();
        let who = service.validate(&renewed.access_token).await.unwrap();
        assert_eq!(who.id, subject());
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let service = service();
        let token = forge(SECRET, TokenType::Access, -3600);

        assert_eq!(service.validate(&token).await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let service = service();
        let token = forge("some-other-secret-entirely-different", TokenType::Access, 600);

        assert_eq!(service.validate(&token).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        let service = service();
        assert_eq!(
            service.validate("not.a.jwt").await,
            Err(AuthError::InvalidToken)
        );
    }
}
