//! Client session manager.
//!
//! Runs `safe_connect` and the lifetime of the resulting stream on a named
//! thread, so a caller such as a UI loop never blocks on the network.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::runtime::Builder;
use tokio::sync::watch;

use super::error::ClientError;
use super::session::ClientSession;
use super::stream::SnapshotConsumer;

const CLIENT_THREAD_NAME: &str = "psmonitor-client";

struct Running {
    thread: JoinHandle<Result<(), ClientError>>,
    stop: watch::Sender<bool>,
}

/// Owns the session-management thread.
///
/// When a live stream ends the manager connects again, through the same
/// probe and backoff, unless reconnection is turned off. It finishes when
/// stopped, when reconnection is off and the stream ends, or on the first
/// error `safe_connect` returns.
pub struct ClientSessionManager {
    session: Arc<ClientSession>,
    consumer: Arc<dyn SnapshotConsumer>,
    reconnect: bool,
    running: Option<Running>,
}

impl ClientSessionManager {
    pub fn new(session: ClientSession, consumer: Arc<dyn SnapshotConsumer>) -> Self {
        Self {
            session: Arc::new(session),
            consumer,
            reconnect: true,
            running: None,
        }
    }

    pub fn reconnect_on_close(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Whether the session thread is alive.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.thread.is_finished())
    }

    /// Spawn the session thread. A no-op while one is already running.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if self.is_running() {
            tracing::debug!("Client session already running");
            return Ok(());
        }
        // Reap a finished thread from a previous start.
        if let Some(previous) = self.running.take() {
            let _ = previous.thread.join();
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let session = self.session.clone();
        let consumer = self.consumer.clone();
        let reconnect = self.reconnect;

        let thread = thread::Builder::new()
            .name(CLIENT_THREAD_NAME.to_string())
            .spawn(move || run(session, consumer, reconnect, stop_rx))
            .map_err(ClientError::transport)?;

        self.running = Some(Running {
            thread,
            stop: stop_tx,
        });
        Ok(())
    }

    /// Ask the session to end and wait for its thread.
    pub fn stop(&mut self) -> Result<(), ClientError> {
        if let Some(running) = &self.running {
            let _ = running.stop.send(true);
        }
        self.wait()
    }

    /// Wait for the session thread to finish on its own.
    pub fn wait(&mut self) -> Result<(), ClientError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        match running.thread.join() {
            Ok(result) => result,
            Err(_) => Err(ClientError::transport("client session thread panicked")),
        }
    }
}

impl Drop for ClientSessionManager {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run(
    session: Arc<ClientSession>,
    consumer: Arc<dyn SnapshotConsumer>,
    reconnect: bool,
    mut stop: watch::Receiver<bool>,
) -> Result<(), ClientError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ClientError::transport)?;

    runtime.block_on(async move {
        loop {
            let mut connection = tokio::select! {
                result = session.safe_connect(consumer.clone()) => result?,
                _ = stop.wait_for(|stopping| *stopping) => return Ok(()),
            };

            let stopped = tokio::select! {
                _ = connection.closed() => false,
                _ = stop.wait_for(|stopping| *stopping) => true,
            };
            connection.close();

            if stopped || !reconnect {
                return Ok(());
            }
            tracing::info!("Stream ended; reconnecting");
        }
    })
}
