//! HTTP DTOs (Data Transfer Objects).
//!
//! These types define the JSON request/response structure of the API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::ports::TokenPair;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Login request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

/// Request to exchange a refresh token.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Token pair returned by `/authenticate` and `/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Access token for `Authorization: Bearer`.
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }
    }
}

/// Handshake result.
///
/// On failure both `id` and `url` are null and `message` carries the reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandshakeResponse {
    pub id: Option<String>,
    pub url: Option<String>,
    pub message: String,
}

impl HandshakeResponse {
    pub fn accepted(id: String, url: String, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            url: Some(url),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            id: None,
            url: None,
            message: message.into(),
        }
    }
}

/// Liveness report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub active_connections: usize,
    pub pending_workers: usize,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticate_request_deserializes() {
        let json = r#"{"username": "psmonitor", "password": "hunter2"}"#;
        let request: AuthenticateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "psmonitor");
        assert_eq!(request.password, "hunter2");
    }

    #[test]
    fn failed_handshake_serializes_nulls() {
        let json = serde_json::to_value(HandshakeResponse::failed("registry full")).unwrap();
        assert!(json["id"].is_null());
        assert!(json["url"].is_null());
        assert_eq!(json["message"], "registry full");
    }

    #[test]
    fn token_response_renames_access_token() {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: 900,
        };
        let json = serde_json::to_value(TokenResponse::from(pair)).unwrap();
        assert_eq!(json["token"], "a");
        assert_eq!(json["refresh_token"], "r");
    }
}
