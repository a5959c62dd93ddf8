//! WebSocket upgrade handler for streaming sessions.
//!
//! Route: `GET /connect?id=<worker>&feed=system|network`
//!
//! The upgrade itself is unauthenticated. The worker id, obtained from the
//! authenticated handshake, is the capability that admits the stream.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ws::WebSocket, FromRef, Query, State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};
use futures::StreamExt;
use tokio::sync::watch;

use crate::adapters::metrics::MetricsSampler;
use crate::domain::session::SessionError;
use crate::domain::worker::WorkerRegistry;

use super::connections::ActiveConnectionSet;
use super::messages::{ConnectParams, CONNECT_PATH};
use super::session::StreamingSession;

/// State required for WebSocket handling.
///
/// Extracted from the application state.
#[derive(Clone)]
pub struct StreamState {
    pub registry: Arc<WorkerRegistry>,
    pub connections: Arc<ActiveConnectionSet>,
    pub sampler: MetricsSampler,
    pub sample_interval: Duration,
    /// Flips to `true` when the server begins shutting down.
    pub shutdown: watch::Receiver<bool>,
}

/// Handle WebSocket upgrade requests.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<StreamState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

async fn handle_socket(socket: WebSocket, params: ConnectParams, state: StreamState) {
    let session = StreamingSession::new(state, params.feed);
    let session_id = session.id();
    let (sender, receiver) = socket.split();

    match session.run(sender, receiver, params.id).await {
        Ok(()) => {}
        Err(SessionError::Provider(e)) => {
            tracing::error!(session_id = %session_id, error = %e, "Session ended by provider failure");
        }
        Err(e) => {
            tracing::debug!(session_id = %session_id, code = e.code(), "Session rejected");
        }
    }
}

/// Router exposing the streaming endpoint.
pub fn stream_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    StreamState: FromRef<S>,
{
    Router::new().route(CONNECT_PATH, get(ws_handler))
}
