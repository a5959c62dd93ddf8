//! Client-side view of the server's HTTP and streaming endpoints.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::adapters::http::dto::{
    AuthenticateRequest, ErrorResponse, HandshakeResponse, TokenResponse,
};
use crate::adapters::websocket::Feed;
use crate::config::ClientConfig;

use super::error::ClientError;

/// A frame read from the streaming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    /// The server closed the stream, with its close code if it sent one.
    Closed(Option<u16>),
}

pub type IncomingStream = BoxStream<'static, Result<Incoming, ClientError>>;

/// A worker issued by the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerTicket {
    pub id: String,
    pub url: String,
    pub message: String,
}

impl WorkerTicket {
    /// Streaming URL for `feed`; the handshake URL already selects `system`.
    pub fn stream_url(&self, feed: Feed) -> String {
        match feed {
            Feed::System => self.url.clone(),
            Feed::Network => format!("{}&feed={}", self.url, feed),
        }
    }
}

/// Operations the client session performs against a server.
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// Lightweight reachability check: open and drop a transport connection.
    async fn probe(&self, timeout: Duration) -> bool;

    /// Exchange credentials for an access token.
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<String, ClientError>;

    /// Ask for a worker with the access token.
    async fn handshake(&self, access_token: &str) -> Result<WorkerTicket, ClientError>;

    /// Open the streaming connection.
    ///
    /// Called from the thread that will read the stream, so the returned
    /// stream is driven by that thread's runtime.
    async fn connect_stream(&self, url: &str) -> Result<IncomingStream, ClientError>;
}

/// Bound on one HTTP request or WebSocket connect when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ServerApi`] over HTTP (`reqwest`) and WebSocket (`tokio-tungstenite`).
#[derive(Debug, Clone)]
pub struct HttpServerApi {
    base: Url,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpServerApi {
    /// `base_url` is the server root, e.g. `http://localhost:4500`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Like [`HttpServerApi::new`], with every request and stream connect
    /// bounded by `request_timeout`.
    ///
    /// A server that accepts TCP but never answers then fails the attempt
    /// with a transport error instead of stalling it.
    pub fn with_timeout(base_url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::Protocol(format!("invalid server url {base_url}: {e}")))?;
        if base.host_str().is_none() {
            return Err(ClientError::Protocol(format!(
                "server url {base_url} has no host"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ClientError::transport)?;

        Ok(Self {
            base,
            client,
            request_timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_timeout(&config.server_url, config.request_timeout())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Protocol(e.to_string()))
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        }
    }
}

#[async_trait]
impl ServerApi for HttpServerApi {
    async fn probe(&self, timeout: Duration) -> bool {
        let (Some(host), Some(port)) = (self.base.host_str(), self.base.port_or_known_default())
        else {
            return false;
        };
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
            Ok(Ok(_))
        )
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<String, ClientError> {
        let body = AuthenticateRequest {
            username: username.to_string(),
            password: password.expose_secret().to_string(),
        };

        let response = self
            .client
            .post(self.endpoint("/authenticate")?)
            .json(&body)
            .send()
            .await
            .map_err(ClientError::transport)?;

        match response.status() {
            status if status.is_success() => {
                let tokens: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| ClientError::Protocol(e.to_string()))?;
                Ok(tokens.token)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Authentication(
                Self::error_message(response).await,
            )),
            _ => Err(ClientError::Transport(Self::error_message(response).await)),
        }
    }

    async fn handshake(&self, access_token: &str) -> Result<WorkerTicket, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/worker")?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Authentication(
                Self::error_message(response).await,
            ));
        }

        let body: HandshakeResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Handshake(format!("{status}: {e}")))?;

        match (status.is_success(), body.id, body.url) {
            (true, Some(id), Some(url)) => Ok(WorkerTicket {
                id,
                url,
                message: body.message,
            }),
            _ => Err(ClientError::Handshake(body.message)),
        }
    }

    async fn connect_stream(&self, url: &str) -> Result<IncomingStream, ClientError> {
        let (socket, _) = tokio::time::timeout(self.request_timeout, connect_async(url))
            .await
            .map_err(|_| ClientError::transport(format!("stream connect timed out: {url}")))?
            .map_err(ClientError::transport)?;

        let incoming = socket.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => Some(Ok(Incoming::Text(text.as_str().to_owned()))),
                Ok(Message::Close(frame)) => {
                    Some(Ok(Incoming::Closed(frame.map(|f| u16::from(f.code)))))
                }
                Ok(_) => None,
                Err(e) => Some(Err(ClientError::transport(e))),
            }
        });

        Ok(incoming.boxed())
    }
}
