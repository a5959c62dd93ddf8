//! Connecting a client session with reachability probing and backoff.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::adapters::websocket::Feed;
use crate::config::ClientConfig;

use super::api::ServerApi;
use super::backoff::Backoff;
use super::error::ClientError;
use super::stream::{SnapshotConsumer, StreamConnection};

/// Credentials, backoff and feed for one client.
pub struct ClientSession {
    api: Arc<dyn ServerApi>,
    username: String,
    password: SecretString,
    backoff: Backoff,
    probe_timeout: Duration,
    feed: Feed,
}

impl ClientSession {
    pub fn new(
        api: Arc<dyn ServerApi>,
        username: impl Into<String>,
        password: SecretString,
        backoff: Backoff,
    ) -> Self {
        Self {
            api,
            username: username.into(),
            password,
            backoff,
            probe_timeout: Duration::from_secs(1),
            feed: Feed::default(),
        }
    }

    /// Build from configuration; the password is required.
    pub fn from_config(api: Arc<dyn ServerApi>, config: &ClientConfig) -> Result<Self, ClientError> {
        let password = config.password.clone().ok_or_else(|| {
            ClientError::Authentication("no client password configured".to_string())
        })?;
        Ok(Self::new(
            api,
            config.username.clone(),
            password,
            Backoff::new(config.base_delay(), config.max_attempts),
        )
        .with_probe_timeout(config.probe_timeout()))
    }

    pub fn with_feed(mut self, feed: Feed) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn feed(&self) -> Feed {
        self.feed
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Probe, authenticate, handshake and open the stream.
    ///
    /// Unreachable servers and transport or handshake failures consume an
    /// attempt and back off `base * 2^attempt` before the next one.
    /// Authentication failures end immediately, as do pairing and capacity
    /// rejections, which are returned for the caller to decide on.
    #[tracing::instrument(skip_all, fields(feed = %self.feed))]
    pub async fn safe_connect(
        &self,
        consumer: Arc<dyn SnapshotConsumer>,
    ) -> Result<StreamConnection, ClientError> {
        let max_attempts = self.backoff.max_attempts();

        for attempt in 0..max_attempts {
            match self.attempt(consumer.clone()).await {
                Ok(connection) => {
                    tracing::info!(attempt, url = %connection.url(), "Streaming session established");
                    return Ok(connection);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "Connection attempt failed");
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(attempt, error = %e, "Giving up");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Stream rejected");
                    return Err(e);
                }
            }

            if self.backoff.has_next(attempt) {
                let delay = self.backoff.delay(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                tokio::time::sleep(delay).await;
            }
        }

        let error = ClientError::Unreachable {
            attempts: max_attempts,
        };
        tracing::error!(error = %error, "Giving up");
        Err(error)
    }

    async fn attempt(
        &self,
        consumer: Arc<dyn SnapshotConsumer>,
    ) -> Result<StreamConnection, ClientError> {
        if !self.api.probe(self.probe_timeout).await {
            return Err(ClientError::transport("server unreachable"));
        }

        let token = self.api.authenticate(&self.username, &self.password).await?;
        let ticket = self.api.handshake(&token).await?;
        tracing::debug!(worker_id = %ticket.id, message = %ticket.message, "Worker issued");

        StreamConnection::open(
            self.api.clone(),
            ticket.stream_url(self.feed),
            self.feed,
            consumer,
        )
        .await
    }
}
