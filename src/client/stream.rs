//! Client end of a streaming session.
//!
//! The connection is read on its own named thread with its own runtime.
//! Snapshots go to a [`SnapshotConsumer`], which therefore must be safe to
//! call from that thread.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use futures::StreamExt;
use tokio::runtime::Builder;
use tokio::sync::{oneshot, watch};

use crate::adapters::websocket::messages::close_code;
use crate::adapters::websocket::{Feed, CONNECTED_MESSAGE};
use crate::domain::metrics::{NetworkSnapshot, SystemSnapshot};
use crate::domain::session::{CAPACITY_MESSAGE, INVALID_WORKER_MESSAGE};

use super::api::{Incoming, IncomingStream, ServerApi};
use super::error::ClientError;

const STREAM_THREAD_NAME: &str = "psmonitor-stream";

/// A decoded snapshot from either feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    System(SystemSnapshot),
    Network(NetworkSnapshot),
}

impl Snapshot {
    pub fn parse(feed: Feed, text: &str) -> Result<Self, serde_json::Error> {
        Ok(match feed {
            Feed::System => Snapshot::System(serde_json::from_str(text)?),
            Feed::Network => Snapshot::Network(serde_json::from_str(text)?),
        })
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self {
            Snapshot::System(s) => format!(
                "cpu {:.1}% | mem {:.1}% | disk {:.1}% | up {}s | {} procs",
                s.cpu.usage_percent,
                s.mem.percent,
                s.disk.percent,
                s.uptime.seconds,
                s.processes.len()
            ),
            Snapshot::Network(n) => format!(
                "{} interfaces | rx {} B | tx {} B",
                n.interfaces.len(),
                n.bytes_received,
                n.bytes_sent
            ),
        }
    }
}

/// Receives what a streaming connection reads.
///
/// Called from the connection's reader thread.
pub trait SnapshotConsumer: Send + Sync {
    fn on_snapshot(&self, snapshot: Snapshot);

    fn on_error(&self, error: &ClientError) {
        tracing::warn!(error = %error, "Stream error");
    }

    fn on_close(&self, code: Option<u16>) {
        tracing::info!(code = ?code, "Stream closed");
    }
}

#[derive(Debug, Default)]
struct SharedState {
    latest: Option<Snapshot>,
    received: u64,
    closed: bool,
    last_error: Option<String>,
}

/// Latest snapshot under a lock, cloned out on read.
///
/// Clones share state, so one can be handed to the stream while another is
/// polled by a UI.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<SharedState>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.lock().latest.clone()
    }

    pub fn received(&self) -> u64 {
        self.lock().received
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }
}

impl SnapshotConsumer for SharedSnapshot {
    fn on_snapshot(&self, snapshot: Snapshot) {
        let mut state = self.lock();
        state.latest = Some(snapshot);
        state.received += 1;
        state.closed = false;
    }

    fn on_error(&self, error: &ClientError) {
        tracing::warn!(error = %error, "Stream error");
        self.lock().last_error = Some(error.to_string());
    }

    fn on_close(&self, code: Option<u16>) {
        tracing::info!(code = ?code, "Stream closed");
        self.lock().closed = true;
    }
}

/// An open stream whose reader runs on a dedicated thread.
///
/// Dropping the connection stops the reader and joins its thread.
pub struct StreamConnection {
    url: String,
    feed: Feed,
    stop: Option<oneshot::Sender<()>>,
    finished: watch::Receiver<bool>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for StreamConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("url", &self.url)
            .field("feed", &self.feed)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl StreamConnection {
    /// Connect to `url` and start reading.
    ///
    /// Resolves once the server acknowledges the stream or rejects it; on
    /// rejection the reader thread has already exited.
    pub async fn open(
        api: Arc<dyn ServerApi>,
        url: impl Into<String>,
        feed: Feed,
        consumer: Arc<dyn SnapshotConsumer>,
    ) -> Result<Self, ClientError> {
        let url = url.into();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (finished_tx, finished_rx) = watch::channel(false);

        let reader = Reader {
            api,
            url: url.clone(),
            feed,
            consumer,
        };
        let thread = thread::Builder::new()
            .name(STREAM_THREAD_NAME.to_string())
            .spawn(move || {
                reader.run(ready_tx, stop_rx);
                let _ = finished_tx.send(true);
            })
            .map_err(ClientError::transport)?;

        let connection = StreamConnection {
            url,
            feed,
            stop: Some(stop_tx),
            finished: finished_rx,
            thread: Some(thread),
        };

        match ready_rx.await {
            Ok(Ok(())) => Ok(connection),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ClientError::transport("stream reader exited before acknowledgement")),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn feed(&self) -> Feed {
        self.feed
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.borrow()
    }

    /// Resolves when the reader stops, for any reason.
    pub async fn closed(&mut self) {
        let _ = self.finished.wait_for(|finished| *finished).await;
    }

    /// Stop reading and join the reader thread.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!(url = %self.url, "Stream reader panicked");
            }
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Reader {
    api: Arc<dyn ServerApi>,
    url: String,
    feed: Feed,
    consumer: Arc<dyn SnapshotConsumer>,
}

impl Reader {
    fn run(
        self,
        ready: oneshot::Sender<Result<(), ClientError>>,
        mut stop: oneshot::Receiver<()>,
    ) {
        let runtime = match Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = ready.send(Err(ClientError::transport(e)));
                return;
            }
        };

        runtime.block_on(async move {
            // Stop, or the connection being dropped mid-open, ends a pending connect.
            let connected = tokio::select! {
                result = self.api.connect_stream(&self.url) => result,
                _ = &mut stop => {
                    tracing::debug!(url = %self.url, "Stream connect abandoned");
                    return;
                }
            };
            match connected {
                Ok(incoming) => pump(incoming, self.feed, self.consumer.as_ref(), ready, stop).await,
                Err(e) => {
                    let _ = ready.send(Err(e));
                }
            }
        });
    }
}

/// Map the server's first frame to the open outcome.
fn acknowledgement(first: Option<Result<Incoming, ClientError>>) -> Result<(), ClientError> {
    match first {
        Some(Ok(Incoming::Text(text))) if text == CONNECTED_MESSAGE => Ok(()),
        Some(Ok(Incoming::Text(text))) if text == CAPACITY_MESSAGE => Err(ClientError::Capacity),
        Some(Ok(Incoming::Text(text))) if text == INVALID_WORKER_MESSAGE => {
            Err(ClientError::InvalidPairing(text))
        }
        Some(Ok(Incoming::Text(text))) => Err(ClientError::Protocol(format!(
            "unexpected first message: {text}"
        ))),
        Some(Ok(Incoming::Closed(Some(close_code::TRY_AGAIN_LATER)))) => Err(ClientError::Capacity),
        Some(Ok(Incoming::Closed(Some(close_code::POLICY)))) => Err(ClientError::InvalidPairing(
            INVALID_WORKER_MESSAGE.to_string(),
        )),
        Some(Ok(Incoming::Closed(_))) | None => Err(ClientError::transport(
            "stream closed before acknowledgement",
        )),
        Some(Err(e)) => Err(e),
    }
}

/// Read frames until the server closes, the transport fails, or `stop` fires.
async fn pump(
    mut incoming: IncomingStream,
    feed: Feed,
    consumer: &dyn SnapshotConsumer,
    ready: oneshot::Sender<Result<(), ClientError>>,
    mut stop: oneshot::Receiver<()>,
) {
    let first = tokio::select! {
        first = incoming.next() => first,
        _ = &mut stop => return,
    };
    let outcome = acknowledgement(first);
    let acknowledged = outcome.is_ok();
    if ready.send(outcome).is_err() || !acknowledged {
        return;
    }
    tracing::info!(feed = %feed, "Stream acknowledged");

    loop {
        tokio::select! {
            _ = &mut stop => {
                tracing::debug!(feed = %feed, "Stream reader stopping");
                return;
            }

            frame = incoming.next() => match frame {
                Some(Ok(Incoming::Text(text))) if text.starts_with('{') => {
                    match Snapshot::parse(feed, &text) {
                        Ok(snapshot) => consumer.on_snapshot(snapshot),
                        Err(e) => tracing::warn!(error = %e, "Skipping malformed snapshot"),
                    }
                }
                Some(Ok(Incoming::Text(text))) => {
                    tracing::debug!(message = %text, "Ignoring non-snapshot message");
                }
                Some(Ok(Incoming::Closed(code))) => {
                    consumer.on_close(code);
                    return;
                }
                Some(Err(e)) => {
                    consumer.on_error(&e);
                    consumer.on_close(None);
                    return;
                }
                None => {
                    consumer.on_close(None);
                    return;
                }
            }
        }
    }
}
