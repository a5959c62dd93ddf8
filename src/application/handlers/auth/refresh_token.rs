//! RefreshTokenHandler - renews a token pair from a refresh token.

use std::sync::Arc;

use crate::domain::foundation::AuthError;
use crate::ports::{TokenIssuer, TokenPair};

#[derive(Debug, Clone)]
pub struct RefreshTokenCommand {
    pub refresh_token: String,
}

pub struct RefreshTokenHandler {
    issuer: Arc<dyn TokenIssuer>,
}

impl RefreshTokenHandler {
    pub fn new(issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { issuer }
    }

    pub async fn handle(&self, cmd: RefreshTokenCommand) -> Result<TokenPair, AuthError> {
        self.issuer.refresh(&cmd.refresh_token).await.map_err(|e| {
            tracing::debug!(error = %e, "Refresh rejected");
            e
        })
    }
}
