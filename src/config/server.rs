//! Server configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to (a name such as `localhost` is resolved)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on; 0 picks a free port when set programmatically
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent streaming connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// How long an unclaimed worker lives, in milliseconds
    #[serde(default = "default_worker_grace_ms")]
    pub worker_grace_ms: u64,

    /// Maximum unclaimed workers outstanding at once
    #[serde(default = "default_max_pending_workers")]
    pub max_pending_workers: usize,

    /// Interval between pushed snapshots, in milliseconds
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Bound on `start()` waiting for readiness, in milliseconds
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// Bound on `stop()` waiting for the server thread, in milliseconds
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Blocking metric jobs allowed in flight; defaults to `min(cores * 2, 16)`
    pub metrics_pool_size: Option<usize>,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// CORS allowed origins (comma-separated); permissive when unset
    pub cors_origins: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl ServerConfig {
    /// `host:port` as handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn worker_grace(&self) -> Duration {
        Duration::from_millis(self.worker_grace_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Get CORS origins as a vector
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.max_connections == 0 {
            return Err(ValidationError::InvalidMaxConnections);
        }
        if self.worker_grace_ms == 0 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        if self.sample_interval_ms == 0 {
            return Err(ValidationError::InvalidSampleInterval);
        }
        if self.startup_timeout_ms == 0 || self.shutdown_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            worker_grace_ms: default_worker_grace_ms(),
            max_pending_workers: default_max_pending_workers(),
            sample_interval_ms: default_sample_interval_ms(),
            startup_timeout_ms: default_startup_timeout_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            metrics_pool_size: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            cors_origins: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    4500
}

fn default_max_connections() -> usize {
    20
}

fn default_worker_grace_ms() -> u64 {
    5000
}

fn default_max_pending_workers() -> usize {
    1024
}

fn default_sample_interval_ms() -> u64 {
    1000
}

fn default_startup_timeout_ms() -> u64 {
    5000
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info,psmonitor=debug,tower_http=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 4500);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.worker_grace(), Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_cors_origins_parsing() {
        let config = ServerConfig {
            cors_origins: Some("http://localhost:5173, http://localhost:3000,".to_string()),
            ..Default::default()
        };
        let origins = config.cors_origins_list();
        assert_eq!(origins, vec!["http://localhost:5173", "http://localhost:3000"]);
    }

    #[test]
    fn test_validation_invalid_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPort)));
    }

    #[test]
    fn test_validation_zero_capacity() {
        let config = ServerConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMaxConnections)
        ));
    }

    #[test]
    fn test_validation_zero_grace() {
        let config = ServerConfig {
            worker_grace_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
