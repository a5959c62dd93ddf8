//! AuthenticateHandler - exchanges credentials for a token pair.

use std::sync::Arc;

use secrecy::SecretString;

use crate::domain::foundation::AuthError;
use crate::ports::{CredentialStore, TokenIssuer, TokenPair};

/// Command carrying login credentials.
#[derive(Debug, Clone)]
pub struct AuthenticateCommand {
    pub username: String,
    pub password: SecretString,
}

/// Handler for the login endpoint.
pub struct AuthenticateHandler {
    credentials: Arc<dyn CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
}

impl AuthenticateHandler {
    pub fn new(credentials: Arc<dyn CredentialStore>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            credentials,
            issuer,
        }
    }

    pub async fn handle(&self, cmd: AuthenticateCommand) -> Result<TokenPair, AuthError> {
        let subject = self.credentials.verify(&cmd.username, &cmd.password).await?;
        let pair = self.issuer.issue(&subject).await?;

        tracing::info!(subject = %subject, "Subject authenticated");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::{InMemoryCredentialStore, JwtConfig, JwtTokenService};
    use crate::ports::TokenValidator;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn setup() -> (AuthenticateHandler, Arc<JwtTokenService>) {
        let store = Arc::new(
            InMemoryCredentialStore::new()
                .with_user("admin", &secret("pw"))
                .unwrap(),
        );
        let tokens = Arc::new(JwtTokenService::new(JwtConfig::new(secret(
            "authenticate-handler-test-secret",
        ))));
        (AuthenticateHandler::new(store, tokens.clone()), tokens)
    }

    #[tokio::test]
    async fn valid_credentials_yield_usable_access_token() {
        let (handler, tokens) = setup();

        let pair = handler
            .handle(AuthenticateCommand {
                username: "admin".to_string(),
                password: secret("pw"),
            })
            .await
            .unwrap();

        assert!(tokens.validate(&pair.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let (handler, _) = setup();

        let result = handler
            .handle(AuthenticateCommand {
                username: "admin".to_string(),
                password: secret("wrong"),
            })
            .await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }
}
