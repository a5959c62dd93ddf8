//! Client configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration for the reconnecting client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base HTTP URL of the server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_username")]
    pub username: String,

    pub password: Option<SecretString>,

    /// Reachability attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay, doubled per attempt, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Timeout of a single reachability probe, in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Bound on each HTTP request and stream connect, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate client configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ValidationError::InvalidServerUrl);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.probe_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            username: default_username(),
            password: None,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:4500".to_string()
}

fn default_username() -> String {
    "psmonitor".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}
