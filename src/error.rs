use thiserror::Error;

/// Everything that can go wrong inside a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("message is too long ({len} > {max} characters)")]
    MessageTooLong { len: usize, max: usize },

    #[error("not connected")]
    NotConnected,

    #[error("sending too fast, slow down")]
    RateLimited,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::MalformedMessage(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SessionError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        SessionError::ConnectionFailed(e.to_string())
    }
}
