//! Logging initialisation.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;

const FALLBACK_DIRECTIVE: &str = "info";

/// `RUST_LOG` when set, else `log_level`, else `info`.
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(log_level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(log_level));

    match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = env_filter("warn,psmonitor=trace");
        assert!(filter.to_string().contains("psmonitor=trace"));
    }

    #[test]
    fn invalid_level_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = env_filter("psmonitor=notalevel");
        assert_eq!(filter.to_string(), FALLBACK_DIRECTIVE);
    }

    #[test]
    fn second_init_is_rejected() {
        let _ = init("info", LogFormat::Pretty);
        assert!(init("info", LogFormat::Json).is_err());
    }
}
