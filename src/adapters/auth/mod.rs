//! Authentication adapters.
//!
//! Implementations of the `CredentialStore`, `TokenIssuer` and
//! `TokenValidator` ports:
//!
//! - `jwt` - HS256 access/refresh tokens
//! - `memory_store` - Salted-digest credential store for the configured user

mod jwt;
mod memory_store;

pub use jwt::{Claims, JwtConfig, JwtTokenService, TokenType};
pub use memory_store::InMemoryCredentialStore;
