//! Application configuration module
//!
//! This module provides type-safe configuration loading using the `config`
//! and `dotenvy` crates. Values come from, in increasing precedence:
//!
//! 1. Built-in defaults
//! 2. An optional configuration file (TOML, JSON or YAML by extension)
//! 3. Environment variables with the `PSMONITOR` prefix, `__` between levels
//!
//! # Example
//!
//! ```no_run
//! use psmonitor::config::AppConfig;
//!
//! let config = AppConfig::load(None).expect("Failed to load configuration");
//! config.validate_server().expect("Invalid configuration");
//!
//! println!("Server listening on {}", config.server.bind_addr());
//! ```

mod auth;
mod client;
mod error;
mod server;

pub use auth::{AuthConfig, MIN_JWT_SECRET_BYTES};
pub use client::ClientConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{LogFormat, ServerConfig};

use std::path::Path;

use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PSMONITOR";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener, streaming and logging settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Login user and token signing
    #[serde(default)]
    pub auth: AuthConfig,

    /// Reconnecting client settings
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads `file` if given; a given file must exist
    /// 3. Reads environment variables with `PSMONITOR` prefix
    /// 4. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `PSMONITOR__SERVER__PORT=4500` -> `server.port = 4500`
    /// - `PSMONITOR__AUTH__JWT_SECRET=...` -> `auth.jwt_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is unreadable or values cannot be
    /// parsed into the expected types.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate what `serve` needs
    pub fn validate_server(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.auth.validate()?;
        Ok(())
    }

    /// Validate what `watch` needs
    pub fn validate_client(&self) -> Result<(), ValidationError> {
        self.client.validate()?;
        if self.client.password.is_none() {
            return Err(ValidationError::MissingRequired("CLIENT__PASSWORD"));
        }
        Ok(())
    }
}
