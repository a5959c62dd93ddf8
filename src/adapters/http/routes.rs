//! Axum router configuration for the HTTP API.

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers::{
    authenticate, create_worker, health, network_snapshot, refresh, system_snapshot, HttpState,
};
use super::middleware::{auth_middleware, AuthState};

/// Create the HTTP API router.
///
/// # Routes
///
/// ## Public
/// - `POST /authenticate` - Credentials to token pair
/// - `POST /refresh` - Refresh token to new pair
/// - `GET /health` - Liveness and counts
///
/// ## Require `Authorization: Bearer <access token>`
/// - `POST /worker` - Handshake, returns `{id, url, message}`
/// - `GET /system` - System snapshot
/// - `GET /network` - Network snapshot
pub fn api_routes<S>(validator: AuthState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HttpState: FromRef<S>,
{
    let protected = Router::new()
        .route("/worker", post(create_worker))
        .route("/system", get(system_snapshot))
        .route("/network", get(network_snapshot))
        .route_layer(middleware::from_fn_with_state(validator, auth_middleware));

    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/refresh", post(refresh))
        .route("/health", get(health))
        .merge(protected)
}
