//! In-memory credential store.
//!
//! Passwords are kept as Argon2id PHC strings (`$argon2id$v=19$...`), each
//! with its own random salt. Verification reads the parameters back out of
//! the stored string and runs on the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::domain::foundation::{AuthError, SubjectId};
use crate::ports::CredentialStore;

const SALT_BYTES: usize = 16;

struct StoredCredential {
    subject: SubjectId,
    phc: Arc<str>,
}

/// Credential store backed by a fixed set of users.
pub struct InMemoryCredentialStore {
    users: HashMap<String, StoredCredential>,
    hasher: Argon2<'static>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store hashing with Argon2id defaults.
    pub fn new() -> Self {
        Self::with_params(default_params())
    }

    /// Creates an empty store hashing new passwords with `params`.
    pub fn with_params(params: Params) -> Self {
        Self {
            users: HashMap::new(),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Adds a user with a freshly generated subject id.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: &SecretString,
    ) -> Result<Self, AuthError> {
        let mut salt = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| AuthError::service_unavailable(format!("salt encoding failed: {e}")))?;

        let phc = self
            .hasher
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|e| AuthError::service_unavailable(format!("password hashing failed: {e}")))?
            .to_string();

        let subject = SubjectId::new(Uuid::new_v4().to_string())
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

        self.users.insert(
            username.into(),
            StoredCredential {
                subject,
                phc: phc.into(),
            },
        );
        Ok(self)
    }

    /// Subject id assigned to `username`, if present.
    pub fn subject_of(&self, username: &str) -> Option<&SubjectId> {
        self.users.get(username).map(|c| &c.subject)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(test))]
fn default_params() -> Params {
    Params::default()
}

// Cheap parameters keep unit tests fast.
#[cfg(test)]
fn default_params() -> Params {
    Params::new(1024, 1, 1, None).unwrap_or_default()
}

fn password_matches(phc: &str, password: &SecretString) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| AuthError::service_unavailable(format!("stored hash unreadable: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .is_ok())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn verify(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SubjectId, AuthError> {
        let Some(stored) = self.users.get(username) else {
            tracing::warn!(username = %username, "Unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        let phc = stored.phc.clone();
        let candidate = password.clone();
        let matches = tokio::task::spawn_blocking(move || password_matches(&phc, &candidate))
            .await
            .map_err(|e| AuthError::service_unavailable(format!("verification task failed: {e}")))??;

        if matches {
            Ok(stored.subject.clone())
        } else {
            tracing::warn!(username = %username, "Password rejected");
            Err(AuthError::InvalidCredentials)
        }
    }
}
