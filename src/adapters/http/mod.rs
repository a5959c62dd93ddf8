//! HTTP adapters - REST API implementations.
//!
//! - `dto` - Request/response bodies
//! - `handlers` - Endpoint handlers and error mapping
//! - `middleware` - Bearer token authentication
//! - `routes` - Router assembly

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{ApiError, HttpState};
pub use middleware::{auth_middleware, AuthState, RequireAuth};
pub use routes::api_routes;
