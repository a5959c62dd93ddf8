//! Wire protocol for the streaming connection.
//!
//! Server → Client:
//! - one plain-text acknowledgement once the worker is claimed
//! - then one JSON snapshot per sample interval
//! - or, on rejection, one plain-text reason followed by a close frame
//!
//! Client → Server:
//! - any text message, answered with `message received <text>`

use serde::{Deserialize, Serialize};

use crate::domain::session::{SessionError, CAPACITY_MESSAGE, INVALID_WORKER_MESSAGE};

/// Sent once the session is bound to its worker.
pub const CONNECTED_MESSAGE: &str = "connected to monitor, transmitting data...";

/// Path of the streaming upgrade endpoint.
pub const CONNECT_PATH: &str = "/connect";

/// Close codes (RFC 6455 §7.4.1 and the IANA registry).
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const POLICY: u16 = 1008;
    pub const INTERNAL: u16 = 1011;
    pub const TRY_AGAIN_LATER: u16 = 1013;
}

/// Which snapshot a session streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    #[default]
    System,
    Network,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::System => "system",
            Feed::Network => "network",
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Feed::System),
            "network" => Ok(Feed::Network),
            other => Err(format!("unknown feed '{other}' (expected system or network)")),
        }
    }
}

/// Query parameters of the upgrade request: `/connect?id=<worker>&feed=<feed>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectParams {
    /// Missing ids are rejected as invalid pairings after the upgrade.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub feed: Feed,
}

/// Builds the URL a client opens to claim `worker_id`.
pub fn connect_url(host: &str, worker_id: &str, feed: Feed) -> String {
    let mut url = format!("ws://{host}{CONNECT_PATH}?id={worker_id}");
    if feed != Feed::System {
        url.push_str("&feed=");
        url.push_str(feed.as_str());
    }
    url
}

/// Reply to an inbound text message.
pub fn echo_reply(text: &str) -> String {
    format!("message received {text}")
}

/// Text and close code sent to a rejected client.
pub fn rejection(error: &SessionError) -> (&'static str, u16) {
    match error {
        SessionError::Capacity => (CAPACITY_MESSAGE, close_code::TRY_AGAIN_LATER),
        SessionError::InvalidWorker => (INVALID_WORKER_MESSAGE, close_code::POLICY),
        SessionError::Provider(_) => ("Metrics unavailable", close_code::INTERNAL),
        SessionError::Transport(_) => ("Connection closed", close_code::GOING_AWAY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_parses_case_insensitively() {
        assert_eq!("Network".parse::<Feed>(), Ok(Feed::Network));
        assert_eq!(" system ".parse::<Feed>(), Ok(Feed::System));
        assert!("disk".parse::<Feed>().is_err());
    }

    #[test]
    fn feed_defaults_to_system() {
        let params: ConnectParams = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(params.feed, Feed::System);
        assert_eq!(params.id.as_deref(), Some("abc"));
    }

    #[test]
    fn feed_parses_lowercase() {
        let params: ConnectParams =
            serde_json::from_str(r#"{"id": "abc", "feed": "network"}"#).unwrap();
        assert_eq!(params.feed, Feed::Network);
    }

    #[test]
    fn connect_url_embeds_worker_id() {
        assert_eq!(
            connect_url("localhost:4500", "tok", Feed::System),
            "ws://localhost:4500/connect?id=tok"
        );
        assert_eq!(
            connect_url("localhost:4500", "tok", Feed::Network),
            "ws://localhost:4500/connect?id=tok&feed=network"
        );
    }

    #[test]
    fn echo_prefixes_text() {
        assert_eq!(echo_reply("ping"), "message received ping");
    }

    #[test]
    fn rejections_carry_distinct_codes() {
        let (text, code) = rejection(&SessionError::Capacity);
        assert_eq!(text, CAPACITY_MESSAGE);
        assert_eq!(code, close_code::TRY_AGAIN_LATER);

        let (text, code) = rejection(&SessionError::InvalidWorker);
        assert_eq!(text, INVALID_WORKER_MESSAGE);
        assert_eq!(code, close_code::POLICY);
    }
}
