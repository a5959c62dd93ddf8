//! HTTP handlers.
//!
//! These handlers connect Axum routes to application layer command handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::SecretString;

use crate::adapters::metrics::MetricsSampler;
use crate::adapters::websocket::{connect_url, ActiveConnectionSet, Feed};
use crate::application::{
    AuthenticateCommand, AuthenticateHandler, CreateWorkerCommand, CreateWorkerHandler,
    RefreshTokenCommand, RefreshTokenHandler,
};
use crate::domain::foundation::AuthError;
use crate::domain::worker::WorkerRegistry;
use crate::ports::{CredentialStore, MetricsError, TokenIssuer};

use super::dto::{
    AuthenticateRequest, ErrorResponse, HandshakeResponse, HealthResponse, RefreshRequest,
    TokenResponse,
};
use super::middleware::RequireAuth;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Dependencies of the HTTP endpoints.
///
/// Cloned for each request; everything inside is shared.
#[derive(Clone)]
pub struct HttpState {
    pub credentials: Arc<dyn CredentialStore>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub registry: Arc<WorkerRegistry>,
    pub connections: Arc<ActiveConnectionSet>,
    pub sampler: MetricsSampler,
    pub worker_grace: Duration,
    /// Used in streaming URLs when the request's `Host` is unusable.
    pub public_authority: String,
}

impl HttpState {
    pub fn authenticate_handler(&self) -> AuthenticateHandler {
        AuthenticateHandler::new(self.credentials.clone(), self.issuer.clone())
    }

    pub fn refresh_token_handler(&self) -> RefreshTokenHandler {
        RefreshTokenHandler::new(self.issuer.clone())
    }

    pub fn create_worker_handler(&self) -> CreateWorkerHandler {
        CreateWorkerHandler::new(self.registry.clone(), self.worker_grace)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Auth Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /authenticate - Exchange credentials for a token pair
pub async fn authenticate(
    State(state): State<HttpState>,
    Json(request): Json<AuthenticateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = AuthenticateCommand {
        username: request.username,
        password: SecretString::new(request.password),
    };

    let pair = state.authenticate_handler().handle(cmd).await?;
    Ok(Json(TokenResponse::from(pair)))
}

/// POST /refresh - Exchange a refresh token for a new pair
pub async fn refresh(
    State(state): State<HttpState>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RefreshTokenCommand {
        refresh_token: request.refresh_token,
    };

    let pair = state.refresh_token_handler().handle(cmd).await?;
    Ok(Json(TokenResponse::from(pair)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Handshake
// ════════════════════════════════════════════════════════════════════════════════

/// POST /worker - Mint a worker id for a subsequent streaming connection
///
/// Failures are reported in the body with null `id`/`url`, never as a crash.
pub async fn create_worker(
    State(state): State<HttpState>,
    RequireAuth(subject): RequireAuth,
    headers: HeaderMap,
) -> impl IntoResponse {
    let cmd = CreateWorkerCommand {
        subscriber: subject.id,
    };

    match state.create_worker_handler().handle(cmd) {
        Ok(result) => {
            let host = stream_authority(&headers, &state.public_authority);
            let id = result.worker_id.as_str().to_string();
            let url = connect_url(&host, &id, Feed::System);
            let message = format!(
                "Worker created; connect within {}ms",
                state.worker_grace.as_millis()
            );
            (
                StatusCode::OK,
                Json(HandshakeResponse::accepted(id, url, message)),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Handshake failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HandshakeResponse::failed(e.to_string())),
            )
        }
    }
}

/// Authority for the streaming URL: the request's `Host` when it is a plain
/// `host[:port]`, otherwise the server's own address.
fn stream_authority(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.parse::<Authority>().ok())
        .filter(|authority| !authority.as_str().contains('@'))
        .map(|authority| authority.as_str().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

// ════════════════════════════════════════════════════════════════════════════════
// Point-in-time Metrics
// ════════════════════════════════════════════════════════════════════════════════

/// GET /system - One system snapshot
pub async fn system_snapshot(
    State(state): State<HttpState>,
    RequireAuth(_subject): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.sampler.system().await?))
}

/// GET /network - One network snapshot
pub async fn network_snapshot(
    State(state): State<HttpState>,
    RequireAuth(_subject): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.sampler.network().await?))
}

/// GET /health - Liveness plus connection counts
pub async fn health(State(state): State<HttpState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_connections: state.connections.len(),
        pending_workers: state.registry.len(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Mapping
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper mapping domain errors onto HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Metrics(MetricsError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<MetricsError> for ApiError {
    fn from(err: MetricsError) -> Self {
        Self::Metrics(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            ApiError::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            ApiError::Auth(AuthError::ServiceUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "AUTH_UNAVAILABLE")
            }
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            ApiError::Metrics(e) => {
                tracing::error!(error = %e, "Metrics request failed");
                (StatusCode::SERVICE_UNAVAILABLE, "METRICS_UNAVAILABLE")
            }
        };

        let message = match &self {
            ApiError::Auth(e) => e.to_string(),
            ApiError::Metrics(e) => e.to_string(),
        };
        (status, Json(ErrorResponse::new(message, code))).into_response()
    }
}
