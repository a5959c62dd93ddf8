//! Streaming session - one live connection pushing metric snapshots.
//!
//! ```text
//! Opening ──admit──claim──▶ Streaming ──close/error/shutdown──▶ Closed
//!    │                                                           ▲
//!    └──────────── capacity / invalid worker ────────────────────┘
//! ```
//!
//! Cleanup never depends on which path the session leaves by: the
//! connection slot is a [`ConnectionGuard`] and the claimed worker is a
//! [`WorkerLease`], and both release themselves on drop.

use std::fmt::Display;

use axum::extract::ws::{CloseFrame, Message};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::MissedTickBehavior;

use crate::application::{ClaimWorkerCommand, ClaimWorkerHandler};
use crate::domain::foundation::{SessionId, StateMachine};
use crate::domain::session::{SessionError, SessionState};
use crate::domain::worker::Worker;

use super::handler::StreamState;
use super::messages::{close_code, echo_reply, rejection, Feed, CONNECTED_MESSAGE};

/// Owns a claimed worker for the lifetime of a session.
///
/// Released on drop; a used worker never goes back into the registry.
pub struct WorkerLease(Option<Worker>);

impl WorkerLease {
    pub fn new(worker: Worker) -> Self {
        Self(Some(worker))
    }
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        if let Some(worker) = self.0.take() {
            worker.release();
        }
    }
}

/// Server side of one streaming connection.
pub struct StreamingSession {
    id: SessionId,
    feed: Feed,
    state: SessionState,
    ctx: StreamState,
}

impl StreamingSession {
    pub fn new(ctx: StreamState, feed: Feed) -> Self {
        Self {
            id: SessionId::new(),
            feed,
            state: SessionState::Opening,
            ctx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        match self.state.transition_to(next) {
            Ok(state) => {
                tracing::debug!(session_id = %self.id, from = ?self.state, to = ?state, "Session state");
                self.state = state;
            }
            Err(e) => tracing::warn!(session_id = %self.id, error = %e, "Ignored session transition"),
        }
    }

    /// Drives the session to completion.
    ///
    /// Returns `Ok` for clean closes and transport drops, which are expected.
    /// Rejections and provider failures come back as `Err`.
    pub async fn run<Si, St, E>(
        mut self,
        mut sender: Si,
        mut receiver: St,
        worker_id: Option<String>,
    ) -> Result<(), SessionError>
    where
        Si: Sink<Message> + Unpin,
        Si::Error: Display,
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        // Opening: admission before the claim so a full server consumes no worker.
        let Some(_slot) = self.ctx.connections.try_admit(self.id) else {
            return self.reject(&mut sender, SessionError::Capacity).await;
        };

        let claim = ClaimWorkerHandler::new(self.ctx.registry.clone()).handle(ClaimWorkerCommand {
            worker_id: worker_id.unwrap_or_default(),
            session_id: self.id,
        });
        let _lease = match claim {
            Ok(worker) => WorkerLease::new(worker),
            Err(e) => return self.reject(&mut sender, e).await,
        };

        self.advance(SessionState::Streaming);
        tracing::info!(session_id = %self.id, feed = %self.feed, "Streaming session opened");

        let result = match sender.send(Message::Text(CONNECTED_MESSAGE.to_string())).await {
            Ok(()) => self.stream(&mut sender, &mut receiver).await,
            Err(e) => {
                tracing::info!(session_id = %self.id, error = %e, "Client left before acknowledgement");
                Ok(())
            }
        };

        self.advance(SessionState::Closed);
        tracing::info!(session_id = %self.id, "Streaming session closed");
        result
    }

    async fn stream<Si, St, E>(&mut self, sender: &mut Si, receiver: &mut St) -> Result<(), SessionError>
    where
        Si: Sink<Message> + Unpin,
        Si::Error: Display,
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let mut ticker = tokio::time::interval(self.ctx.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.ctx.shutdown.clone();
        if *shutdown.borrow_and_update() {
            close(sender, close_code::GOING_AWAY, "Server shutting down").await;
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::debug!(session_id = %self.id, "Server shutdown observed");
                    close(sender, close_code::GOING_AWAY, "Server shutting down").await;
                    return Ok(());
                }

                inbound = receiver.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(session_id = %self.id, text = %text, "Client message");
                        if let Err(e) = sender.send(Message::Text(echo_reply(&text))).await {
                            return self.transport_closed(e);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(session_id = %self.id, "Client closed connection");
                        return Ok(());
                    }
                    // Binary payloads are ignored; pings are answered by the transport.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return self.transport_closed(e),
                },

                _ = ticker.tick() => {
                    match self.sample().await {
                        Ok(Some(payload)) => {
                            if let Err(e) = sender.send(Message::Text(payload)).await {
                                return self.transport_closed(e);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(session_id = %self.id, error = %e, "Metrics provider failed");
                            let (reason, code) = rejection(&e);
                            close(sender, code, reason).await;
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// One serialized snapshot, or `None` when the provider had nothing.
    async fn sample(&self) -> Result<Option<String>, SessionError> {
        let payload = match self.feed {
            Feed::System => {
                let snapshot = self
                    .ctx
                    .sampler
                    .system()
                    .await
                    .map_err(|e| SessionError::provider(e.to_string()))?;
                if snapshot.is_empty() {
                    return Ok(None);
                }
                serde_json::to_string(&snapshot)
            }
            Feed::Network => {
                let snapshot = self
                    .ctx
                    .sampler
                    .network()
                    .await
                    .map_err(|e| SessionError::provider(e.to_string()))?;
                if snapshot.is_empty() {
                    return Ok(None);
                }
                serde_json::to_string(&snapshot)
            }
        };

        payload
            .map(Some)
            .map_err(|e| SessionError::provider(e.to_string()))
    }

    /// Transport failures end the session quietly.
    fn transport_closed(&self, error: impl Display) -> Result<(), SessionError> {
        let error = SessionError::transport(error.to_string());
        debug_assert!(error.is_expected_disconnect());
        tracing::info!(session_id = %self.id, code = error.code(), error = %error, "Transport closed");
        Ok(())
    }

    async fn reject<Si>(&mut self, sender: &mut Si, error: SessionError) -> Result<(), SessionError>
    where
        Si: Sink<Message> + Unpin,
        Si::Error: Display,
    {
        tracing::warn!(session_id = %self.id, code = error.code(), "Streaming session rejected");

        let (reason, code) = rejection(&error);
        if sender.send(Message::Text(reason.to_string())).await.is_ok() {
            close(sender, code, reason).await;
        }

        self.advance(SessionState::Closed);
        Err(error)
    }
}

async fn close<Si>(sender: &mut Si, code: u16, reason: &'static str)
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = sender.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "Close frame not delivered");
    }
}
