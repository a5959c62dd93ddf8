//! Shared helpers for integration tests: a real server on an ephemeral port.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use psmonitor::adapters::auth::{InMemoryCredentialStore, JwtConfig, JwtTokenService};
use psmonitor::adapters::metrics::FixedMetricsProvider;
use psmonitor::config::ServerConfig;
use psmonitor::server::{ServerDeps, ServerLifecycleManager};

pub const USERNAME: &str = "psmonitor";
pub const PASSWORD: &str = "hunter2";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        sample_interval_ms: 50,
        shutdown_timeout_ms: 1000,
        ..Default::default()
    }
}

/// Cheap Argon2 cost so logins stay fast in debug builds.
fn fast_hashing() -> argon2::Params {
    argon2::Params::new(1024, 1, 1, None).unwrap()
}

pub fn deps() -> ServerDeps {
    let tokens = Arc::new(JwtTokenService::new(JwtConfig::new(SecretString::new(
        "integration-secret-0123456789abcdef".to_string(),
    ))));
    ServerDeps {
        credentials: Arc::new(
            InMemoryCredentialStore::with_params(fast_hashing())
                .with_user(USERNAME, &SecretString::new(PASSWORD.to_string()))
                .unwrap(),
        ),
        issuer: tokens.clone(),
        validator: tokens,
        provider: Arc::new(FixedMetricsProvider::new()),
    }
}

/// A running server and an HTTP client pointed at it.
pub struct TestServer {
    pub manager: ServerLifecycleManager,
    pub base: String,
    pub http: reqwest::Client,
}

impl TestServer {
    pub fn start(config: ServerConfig) -> Self {
        let mut manager = ServerLifecycleManager::new(config, deps());
        let handle = manager.start(0).expect("server should start");
        Self {
            manager,
            base: format!("http://{}", handle.local_addr),
            http: reqwest::Client::new(),
        }
    }

    pub fn rebase(&mut self) {
        let addr = self.manager.local_addr().expect("server should be running");
        self.base = format!("http://{addr}");
    }

    pub async fn login(&self) -> Value {
        let response = self
            .http
            .post(format!("{}/authenticate", self.base))
            .json(&json!({ "username": USERNAME, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    pub async fn token(&self) -> String {
        self.login().await["token"].as_str().unwrap().to_string()
    }

    /// POST /worker with a fresh token; returns status and body.
    pub async fn handshake(&self) -> (u16, Value) {
        let token = self.token().await;
        let response = self
            .http
            .post(format!("{}/worker", self.base))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// Handshake and return the streaming URL.
    pub async fn worker_url(&self) -> String {
        let (status, body) = self.handshake().await;
        assert_eq!(status, 200, "handshake failed: {body}");
        body["url"].as_str().unwrap().to_string()
    }

    pub async fn health(&self) -> Value {
        self.http
            .get(format!("{}/health", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Poll /health until `active_connections` equals `n`.
    pub async fn wait_for_active(&self, n: u64) {
        timeout(TIMEOUT, async {
            loop {
                if self.health().await["active_connections"] == n {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("active connection count never settled");
    }
}

pub async fn open(url: &str) -> WsStream {
    let (ws, _) = timeout(TIMEOUT, connect_async(url))
        .await
        .expect("connect timed out")
        .expect("connect failed");
    ws
}

/// Next text frame; panics on close or timeout.
pub async fn next_text(ws: &mut WsStream) -> String {
    loop {
        let frame = timeout(TIMEOUT, ws.next())
            .await
            .expect("no frame in time")
            .expect("stream ended")
            .expect("transport error");
        match frame {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Close(frame) => panic!("closed: {frame:?}"),
            _ => continue,
        }
    }
}

/// Next JSON snapshot, skipping other text.
pub async fn next_snapshot(ws: &mut WsStream) -> Value {
    loop {
        let text = next_text(ws).await;
        if text.starts_with('{') {
            return serde_json::from_str(&text).expect("snapshot should be JSON");
        }
    }
}

/// Close code of the close frame, skipping anything before it.
pub async fn close_code(ws: &mut WsStream) -> Option<u16> {
    loop {
        match timeout(TIMEOUT, ws.next()).await.expect("no close in time") {
            Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return None,
        }
    }
}
