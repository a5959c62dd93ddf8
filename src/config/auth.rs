//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Minimum HMAC secret length in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Authentication configuration for the server side
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The single user allowed to log in
    #[serde(default = "default_username")]
    pub username: String,

    /// That user's password
    pub password: Option<SecretString>,

    /// HS256 signing secret
    pub jwt_secret: Option<SecretString>,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Serving requires both a password and a sufficiently long secret.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__USERNAME"));
        }
        match &self.password {
            Some(p) if !p.expose_secret().is_empty() => {}
            _ => return Err(ValidationError::MissingRequired("AUTH__PASSWORD")),
        }
        match &self.jwt_secret {
            None => return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET")),
            Some(s) if s.expose_secret().len() < MIN_JWT_SECRET_BYTES => {
                return Err(ValidationError::JwtSecretTooShort(MIN_JWT_SECRET_BYTES));
            }
            Some(_) => {}
        }
        if self.access_token_ttl_minutes <= 0 || self.refresh_token_ttl_days <= 0 {
            return Err(ValidationError::InvalidTokenLifetime);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            jwt_secret: None,
            access_token_ttl_minutes: default_access_token_ttl_minutes(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
        }
    }
}

fn default_username() -> String {
    "psmonitor".to_string()
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_days() -> i64 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::new(s.to_string()))
    }

    fn valid() -> AuthConfig {
        AuthConfig {
            password: secret("hunter2"),
            jwt_secret: secret("0123456789abcdef0123456789abcdef"),
            ..Default::default()
        }
    }

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.username, "psmonitor");
        assert_eq!(config.access_token_ttl_minutes, 15);
        assert_eq!(config.refresh_token_ttl_days, 7);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_password_fails() {
        let config = AuthConfig {
            password: None,
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("AUTH__PASSWORD"))
        ));
    }

    #[test]
    fn test_short_secret_fails() {
        let config = AuthConfig {
            jwt_secret: secret("short"),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::JwtSecretTooShort(32))
        ));
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("hunter2"));
    }
}
