//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! ## Metrics
//!
//! - `MetricsProvider` - Blocking source of system and network snapshots
//!
//! ## Authentication
//!
//! - `CredentialStore` - Username/password verification yielding a subject
//! - `TokenIssuer` - Mints access/refresh token pairs
//! - `TokenValidator` - Validates Bearer access tokens

mod credential_store;
mod metrics_provider;
mod token_service;

pub use credential_store::CredentialStore;
pub use metrics_provider::{MetricsError, MetricsProvider};
pub use token_service::{TokenIssuer, TokenPair, TokenValidator};
