//! psmonitor binary
//!
//! ## Usage
//!
//! ```bash
//! # Serve metrics until Ctrl-C
//! PSMONITOR__AUTH__PASSWORD=... PSMONITOR__AUTH__JWT_SECRET=... psmonitor serve
//!
//! # Watch a server, one summary line per snapshot
//! PSMONITOR__CLIENT__PASSWORD=... psmonitor watch --feed network
//!
//! # Settings from a file, verbose logging
//! RUST_LOG=psmonitor=trace psmonitor --config psmonitor.toml serve
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use psmonitor::adapters::auth::{InMemoryCredentialStore, JwtConfig, JwtTokenService};
use psmonitor::adapters::metrics::SysinfoMetricsProvider;
use psmonitor::adapters::websocket::Feed;
use psmonitor::client::{
    ClientSession, ClientSessionManager, HttpServerApi, Snapshot, SnapshotConsumer,
};
use psmonitor::config::AppConfig;
use psmonitor::server::{ServerDeps, ServerLifecycleManager};
use psmonitor::telemetry;

/// Host metrics monitor.
#[derive(Parser, Debug)]
#[command(name = "psmonitor", version, about = "Host metrics monitor")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve metrics until interrupted.
    Serve {
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind.
        #[arg(long)]
        port: Option<u16>,

        /// Maximum concurrent streams.
        #[arg(long)]
        max_connections: Option<usize>,

        /// How long an unclaimed worker lives, in milliseconds.
        #[arg(long)]
        worker_grace_ms: Option<u64>,
    },

    /// Connect to a server and print every snapshot.
    Watch {
        /// Server root URL.
        #[arg(long)]
        server_url: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// `system` or `network`.
        #[arg(long, default_value = "system")]
        feed: Feed,

        /// Connection attempts before giving up.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// First backoff delay in milliseconds.
        #[arg(long)]
        base_delay_ms: Option<u64>,
    },
}

/// Prints a summary line per snapshot.
struct SummaryPrinter;

impl SnapshotConsumer for SummaryPrinter {
    fn on_snapshot(&self, snapshot: Snapshot) {
        println!("{}", snapshot.summary());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Err(e) = telemetry::init(&config.server.log_level, config.server.log_format) {
        eprintln!("Logging already initialised: {e}");
    }

    match cli.command {
        Command::Serve {
            host,
            port,
            max_connections,
            worker_grace_ms,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(max) = max_connections {
                config.server.max_connections = max;
            }
            if let Some(grace) = worker_grace_ms {
                config.server.worker_grace_ms = grace;
            }
            serve(config)
        }
        Command::Watch {
            server_url,
            username,
            feed,
            max_attempts,
            base_delay_ms,
        } => {
            if let Some(url) = server_url {
                config.client.server_url = url;
            }
            if let Some(username) = username {
                config.client.username = username;
            }
            if let Some(attempts) = max_attempts {
                config.client.max_attempts = attempts;
            }
            if let Some(delay) = base_delay_ms {
                config.client.base_delay_ms = delay;
            }
            watch(config, feed)
        }
    }
}

fn serve(config: AppConfig) -> Result<()> {
    config.validate_server().context("Invalid server configuration")?;

    let password = config
        .auth
        .password
        .as_ref()
        .context("auth.password is required")?;
    let secret = config
        .auth
        .jwt_secret
        .clone()
        .context("auth.jwt_secret is required")?;

    let tokens = Arc::new(JwtTokenService::new(JwtConfig::new(secret).with_ttls(
        config.auth.access_token_ttl_minutes,
        config.auth.refresh_token_ttl_days,
    )));
    let credentials = InMemoryCredentialStore::new()
        .with_user(config.auth.username.as_str(), password)
        .context("Failed to register the configured user")?;

    let deps = ServerDeps {
        credentials: Arc::new(credentials),
        issuer: tokens.clone(),
        validator: tokens,
        provider: Arc::new(SysinfoMetricsProvider::new()),
    };

    let port = config.server.port;
    let mut manager = ServerLifecycleManager::new(config.server, deps);
    let handle = manager.start(port)?;
    tracing::info!(addr = %handle.local_addr, "psmonitor serving; press Ctrl-C to stop");

    wait_for_interrupt(|| false)?;

    tracing::info!("Interrupt received, stopping");
    manager.stop()?;
    Ok(())
}

fn watch(config: AppConfig, feed: Feed) -> Result<()> {
    config.validate_client().context("Invalid client configuration")?;
    tracing::debug!(user = %config.client.username, url = %config.client.server_url, "Watching");

    let api = Arc::new(HttpServerApi::from_config(&config.client)?);
    let session = ClientSession::from_config(api, &config.client)?.with_feed(feed);
    let mut manager = ClientSessionManager::new(session, Arc::new(SummaryPrinter));
    manager.start()?;

    let interrupted = wait_for_interrupt(|| !manager.is_running())?;
    let result = if interrupted {
        tracing::info!("Interrupt received, stopping");
        manager.stop()
    } else {
        manager.wait()
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if e.is_fatal() {
                tracing::error!(error = %e, "Fatal client error");
            }
            Err(e.into())
        }
    }
}

/// Block until Ctrl-C (returns `true`) or until `finished` reports done.
fn wait_for_interrupt(finished: impl Fn() -> bool) -> Result<bool> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    runtime.block_on(async {
        let mut poll = tokio::time::interval(Duration::from_millis(250));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result.context("Failed to listen for Ctrl-C")?;
                    return Ok(true);
                }
                _ = poll.tick() => {
                    if finished() {
                        return Ok(false);
                    }
                }
            }
        }
    })
}
