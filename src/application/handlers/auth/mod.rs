//! Authentication handlers.

mod authenticate;
mod refresh_token;

pub use authenticate::{AuthenticateCommand, AuthenticateHandler};
pub use refresh_token::{RefreshTokenCommand, RefreshTokenHandler};
