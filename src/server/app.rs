//! Application state and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use http::HeaderValue;
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::http::{api_routes, AuthState, HttpState};
use crate::adapters::metrics::MetricsSampler;
use crate::adapters::websocket::{stream_routes, ActiveConnectionSet, StreamState};
use crate::domain::worker::WorkerRegistry;
use crate::ports::{CredentialStore, TokenIssuer, TokenValidator};

/// Everything one running server instance shares between requests.
///
/// A fresh registry, connection set and shutdown channel are built for
/// every start, so nothing leaks across a restart.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub validator: Arc<dyn TokenValidator>,
    pub registry: Arc<WorkerRegistry>,
    pub connections: Arc<ActiveConnectionSet>,
    pub sampler: MetricsSampler,
    pub worker_grace: Duration,
    pub sample_interval: Duration,
    /// `host:port` the listener is bound to.
    pub public_authority: String,
    pub shutdown: watch::Receiver<bool>,
}

impl FromRef<AppState> for HttpState {
    fn from_ref(state: &AppState) -> Self {
        HttpState {
            credentials: state.credentials.clone(),
            issuer: state.issuer.clone(),
            registry: state.registry.clone(),
            connections: state.connections.clone(),
            sampler: state.sampler.clone(),
            worker_grace: state.worker_grace,
            public_authority: state.public_authority.clone(),
        }
    }
}

impl FromRef<AppState> for StreamState {
    fn from_ref(state: &AppState) -> Self {
        StreamState {
            registry: state.registry.clone(),
            connections: state.connections.clone(),
            sampler: state.sampler.clone(),
            sample_interval: state.sample_interval,
            shutdown: state.shutdown.clone(),
        }
    }
}

/// Build the full router: HTTP API, streaming upgrade, CORS and tracing.
///
/// An empty `cors_origins` list means any origin is allowed.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let validator: AuthState = state.validator.clone();

    Router::new()
        .merge(api_routes(validator))
        .merge(stream_routes())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
