use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name shown for messages that carry no user.
pub const ANONYMOUS: &str = "anon";

/// Domain model đại diện một tin nhắn chat đã được kiểm tra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Payload the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Lifecycle of the single connection a session owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Snapshot of the session published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: ConnectionState,
    /// Reconnect attempt currently in progress, 0 for the first connection.
    pub attempt: u32,
    /// Last failure reason, cleared once the connection opens.
    pub detail: Option<String>,
}

impl SessionStatus {
    pub fn connecting() -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempt: 0,
            detail: None,
        }
    }
}
