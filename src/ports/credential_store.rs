//! CredentialStore port - username/password verification.
//!
//! The store confirms a credential pair and yields the opaque subject id
//! that tokens are minted for. How credentials are persisted is up to the
//! adapter.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::{AuthError, SubjectId};

/// Verifies username/password pairs.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidCredentials` for an unknown user or wrong password
///   (without revealing which)
/// - Return `AuthError::ServiceUnavailable` for transient backend errors
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn verify(&self, username: &str, password: &SecretString)
        -> Result<SubjectId, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    struct SingleUser;

    #[async_trait]
    impl CredentialStore for SingleUser {
        async fn verify(
            &self,
            username: &str,
            password: &SecretString,
        ) -> Result<SubjectId, AuthError> {
            if username == "admin" && password.expose_secret() == "hunter2" {
                Ok(SubjectId::new("admin-id").unwrap())
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    #[tokio::test]
    async fn store_returns_subject_for_valid_pair() {
        let store = SingleUser;
        let subject = store
            .verify("admin", &SecretString::new("hunter2".to_string()))
            .await
            .unwrap();
        assert_eq!(subject.as_str(), "admin-id");
    }

    #[tokio::test]
    async fn store_rejects_bad_password() {
        let store = SingleUser;
        let result = store
            .verify("admin", &SecretString::new("wrong".to_string()))
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn store_trait_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn CredentialStore) {}
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn CredentialStore>>();
    }
}
