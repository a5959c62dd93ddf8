//! Server lifecycle manager.
//!
//! Runs the listener and its tokio runtime on a dedicated, named thread and
//! gives the caller blocking `start`/`stop`/`restart` calls:
//!
//! ```text
//! caller thread                      psmonitor-server thread
//! ─────────────                      ───────────────────────
//! start(port) ──spawn──────────────▶ build runtime, bind listener
//!     │        ◀──handoff (addr, runtime handle)
//!     │        ◀──readiness: Ready | Failed
//!  Ok(ServerHandle)                  axum::serve(..).with_graceful_shutdown
//!
//! stop() ──handle.spawn(signal)────▶ listener stops accepting, sessions close
//!     │        ◀──done channel       runtime.shutdown_timeout(..)
//!  join (bounded)
//! ```

use std::net::SocketAddr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::{Builder, Handle};
use tokio::sync::watch;

use crate::adapters::metrics::MetricsSampler;
use crate::adapters::websocket::ActiveConnectionSet;
use crate::config::ServerConfig;
use crate::domain::foundation::StateMachine;
use crate::domain::session::LifecycleState;
use crate::domain::worker::WorkerRegistry;
use crate::ports::{CredentialStore, MetricsProvider, TokenIssuer, TokenValidator};

use super::app::{build_router, AppState};

const SERVER_THREAD_NAME: &str = "psmonitor-server";

/// Errors reported by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Server is already running")]
    AlreadyRunning,

    #[error("Server is not running")]
    NotRunning,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build server runtime: {0}")]
    Runtime(String),

    #[error("Server did not become ready within {0:?}")]
    StartTimeout(Duration),
}

/// Collaborators shared by every server instance the manager starts.
#[derive(Clone)]
pub struct ServerDeps {
    pub credentials: Arc<dyn CredentialStore>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub validator: Arc<dyn TokenValidator>,
    pub provider: Arc<dyn MetricsProvider>,
}

/// What a successful `start` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHandle {
    pub local_addr: SocketAddr,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }
}

/// Listener details sent from the server thread once the socket is bound.
struct Handoff {
    local_addr: SocketAddr,
    runtime: Handle,
}

enum Readiness {
    Pending,
    Ready,
    Failed(LifecycleError),
}

/// One-shot readiness flag the server thread raises and `start` waits on.
struct ReadySignal {
    state: Mutex<Readiness>,
    cond: Condvar,
}

impl ReadySignal {
    fn new() -> Self {
        Self {
            state: Mutex::new(Readiness::Pending),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Readiness> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, readiness: Readiness) {
        let mut state = self.lock();
        if matches!(*state, Readiness::Pending) {
            *state = readiness;
            self.cond.notify_all();
        }
    }

    /// Block until the flag leaves `Pending` or `timeout` elapses.
    fn wait(&self, timeout: Duration) -> Result<(), LifecycleError> {
        let guard = self.lock();
        let (mut state, result) = self
            .cond
            .wait_timeout_while(guard, timeout, |s| matches!(s, Readiness::Pending))
            .unwrap_or_else(|e| e.into_inner());

        if result.timed_out() {
            return Err(LifecycleError::StartTimeout(timeout));
        }
        match std::mem::replace(&mut *state, Readiness::Ready) {
            Readiness::Failed(e) => Err(e),
            _ => Ok(()),
        }
    }
}

/// A started server: the thread, its runtime and the signal that stops it.
struct RunningServer {
    thread: JoinHandle<()>,
    runtime: Handle,
    shutdown: watch::Sender<bool>,
    done: mpsc::Receiver<()>,
    local_addr: SocketAddr,
}

/// Owns the server thread and exposes blocking start/stop/restart.
///
/// Every `start` builds a fresh worker registry, connection set and
/// shutdown channel, so a restarted server shares no session state with
/// the previous one.
pub struct ServerLifecycleManager {
    config: ServerConfig,
    deps: ServerDeps,
    state: LifecycleState,
    running: Option<RunningServer>,
}

impl ServerLifecycleManager {
    pub fn new(config: ServerConfig, deps: ServerDeps) -> Self {
        Self {
            config,
            deps,
            state: LifecycleState::Stopped,
            running: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Replace the settings used by the next `start`. Only while stopped.
    pub fn reconfigure(&mut self, config: ServerConfig) -> Result<(), LifecycleError> {
        if self.running.is_some() {
            return Err(LifecycleError::AlreadyRunning);
        }
        self.config = config;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Address the running server listens on.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    fn transition(&mut self, next: LifecycleState) {
        match self.state.transition_to(next) {
            Ok(state) => self.state = state,
            Err(e) => tracing::warn!(error = %e, "Unexpected lifecycle transition"),
        }
    }

    /// Start listening on `port` (0 lets the OS choose).
    ///
    /// Blocks until the server is accepting connections, bind fails, or the
    /// startup timeout elapses. A server that misses the timeout is
    /// abandoned: its shutdown sender is dropped, which stops it whenever
    /// it does come up.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, port: u16) -> Result<ServerHandle, LifecycleError> {
        if self.running.is_some() {
            return Err(LifecycleError::AlreadyRunning);
        }
        self.transition(LifecycleState::Starting);

        match self.launch(port) {
            Ok(running) => {
                let handle = ServerHandle {
                    local_addr: running.local_addr,
                };
                self.running = Some(running);
                self.transition(LifecycleState::Running);
                tracing::info!(port = handle.port(), addr = %handle.local_addr, "Server started");
                Ok(handle)
            }
            Err(e) => {
                self.transition(LifecycleState::Stopped);
                tracing::error!(error = %e, port, "Server failed to start");
                Err(e)
            }
        }
    }

    fn launch(&self, port: u16) -> Result<RunningServer, LifecycleError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handoff_tx, handoff_rx) = mpsc::channel::<Handoff>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let ready = Arc::new(ReadySignal::new());

        let sampler = match self.config.metrics_pool_size {
            Some(size) => MetricsSampler::with_pool_size(self.deps.provider.clone(), size),
            None => MetricsSampler::new(self.deps.provider.clone()),
        };
        let app = AppState {
            credentials: self.deps.credentials.clone(),
            issuer: self.deps.issuer.clone(),
            validator: self.deps.validator.clone(),
            registry: Arc::new(WorkerRegistry::new(self.config.max_pending_workers)),
            connections: Arc::new(ActiveConnectionSet::new(self.config.max_connections)),
            sampler,
            worker_grace: self.config.worker_grace(),
            sample_interval: self.config.sample_interval(),
            public_authority: format!("{}:{}", self.config.host, port),
            shutdown: shutdown_rx,
        };

        let task = ServerTask {
            host: self.config.host.clone(),
            port,
            cors_origins: self.config.cors_origins_list(),
            shutdown_timeout: self.config.shutdown_timeout(),
            app,
            handoff: handoff_tx,
            ready: ready.clone(),
        };

        let thread = thread::Builder::new()
            .name(SERVER_THREAD_NAME.to_string())
            .spawn(move || {
                task.run();
                // Signals `stop` only after the runtime has shut down.
                drop(done_tx);
            })
            .map_err(|e| LifecycleError::Runtime(e.to_string()))?;

        ready.wait(self.config.startup_timeout())?;

        // Ready implies the handoff was sent first.
        let handoff = handoff_rx
            .recv_timeout(self.config.startup_timeout())
            .map_err(|_| LifecycleError::StartTimeout(self.config.startup_timeout()))?;

        Ok(RunningServer {
            thread,
            runtime: handoff.runtime,
            shutdown: shutdown_tx,
            done: done_rx,
            local_addr: handoff.local_addr,
        })
    }

    /// Stop the server and wait, bounded, for its thread to finish.
    ///
    /// A thread that overruns the shutdown timeout is logged and detached;
    /// the manager is left stopped either way so `start` can run again.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) -> Result<(), LifecycleError> {
        let Some(running) = self.running.take() else {
            return Err(LifecycleError::NotRunning);
        };
        self.transition(LifecycleState::Stopping);

        let RunningServer {
            thread,
            runtime,
            shutdown,
            done,
            local_addr,
        } = running;

        // The signal is raised from a task on the server's own runtime.
        runtime.spawn(async move {
            if shutdown.send(true).is_err() {
                tracing::debug!("Server already gone when shutdown was requested");
            }
        });

        let timeout = self.config.shutdown_timeout() * 2;
        match done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if thread.join().is_err() {
                    tracing::error!("Server thread panicked");
                }
                tracing::info!(addr = %local_addr, "Server stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::error!(
                    addr = %local_addr,
                    timeout_ms = timeout.as_millis() as u64,
                    "Server thread did not finish in time; detaching"
                );
            }
        }

        self.transition(LifecycleState::Stopped);
        Ok(())
    }

    /// `stop()` if running, then `start(port)`.
    pub fn restart(&mut self, port: u16) -> Result<ServerHandle, LifecycleError> {
        match self.stop() {
            Ok(()) | Err(LifecycleError::NotRunning) => {}
            Err(e) => return Err(e),
        }
        self.start(port)
    }
}

impl Drop for ServerLifecycleManager {
    fn drop(&mut self) {
        if self.running.is_some() {
            let _ = self.stop();
        }
    }
}

/// Everything the server thread owns.
struct ServerTask {
    host: String,
    port: u16,
    cors_origins: Vec<String>,
    shutdown_timeout: Duration,
    app: AppState,
    handoff: mpsc::Sender<Handoff>,
    ready: Arc<ReadySignal>,
}

impl ServerTask {
    fn run(self) {
        let runtime = match Builder::new_multi_thread()
            .enable_all()
            .thread_name("psmonitor-rt")
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                self.ready
                    .set(Readiness::Failed(LifecycleError::Runtime(e.to_string())));
                return;
            }
        };

        let shutdown_timeout = self.shutdown_timeout;
        runtime.block_on(self.serve());
        runtime.shutdown_timeout(shutdown_timeout);
    }

    async fn serve(self) {
        let ServerTask {
            host,
            port,
            cors_origins,
            mut app,
            handoff,
            ready,
            shutdown_timeout: _,
        } = self;

        let listener = match TcpListener::bind((host.as_str(), port)).await {
            Ok(listener) => listener,
            Err(source) => {
                ready.set(Readiness::Failed(LifecycleError::Bind {
                    addr: format!("{host}:{port}"),
                    source,
                }));
                return;
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(source) => {
                ready.set(Readiness::Failed(LifecycleError::Bind {
                    addr: format!("{host}:{port}"),
                    source,
                }));
                return;
            }
        };

        app.public_authority = local_addr.to_string();

        let sent = handoff.send(Handoff {
            local_addr,
            runtime: Handle::current(),
        });
        if sent.is_err() {
            // The caller gave up waiting.
            return;
        }

        let mut shutdown = app.shutdown.clone();
        let router = build_router(app, &cors_origins);

        // Raised from inside the runtime, so the loop is already polling.
        tokio::spawn(async move { ready.set(Readiness::Ready) });

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stopping| *stopping).await;
            })
            .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "Server loop failed");
        }
    }
}
