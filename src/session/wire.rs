//! JSON framing for both directions of the chat socket.
//!
//! Server → client: `{ "text": string, "user"?: string, "timestamp": string }`
//! Client → server: `{ "text": string, "user"?: string }`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::common::{ANONYMOUS, ChatMessage, OutgoingMessage};
use crate::error::SessionError;

/// Raw inbound frame before validation. Every field is optional so that a
/// missing one is reported by name instead of as a generic serde error.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    text: Option<String>,
    user: Option<String>,
    timestamp: Option<String>,
}

/// Parse and validate one inbound text frame.
pub fn decode_inbound(raw: &str) -> Result<ChatMessage, SessionError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(SessionError::MalformedMessage(
            "expected a JSON object".to_string(),
        ));
    }
    let frame: InboundFrame = serde_json::from_value(value)?;

    let text = frame
        .text
        .ok_or_else(|| SessionError::MalformedMessage("missing `text`".to_string()))?;
    if text.trim().is_empty() {
        return Err(SessionError::MalformedMessage("empty `text`".to_string()));
    }

    let raw_timestamp = frame
        .timestamp
        .ok_or_else(|| SessionError::MalformedMessage("missing `timestamp`".to_string()))?;
    let timestamp = parse_timestamp(&raw_timestamp).ok_or_else(|| {
        SessionError::MalformedMessage(format!("unparseable `timestamp`: {raw_timestamp}"))
    })?;

    let user = frame
        .user
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    Ok(ChatMessage {
        user,
        text,
        timestamp,
    })
}

/// Validate and serialize an outgoing message.
pub fn encode_outgoing(
    text: &str,
    user: Option<&str>,
    max_len: usize,
) -> Result<String, SessionError> {
    if text.trim().is_empty() {
        return Err(SessionError::EmptyMessage);
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(SessionError::MessageTooLong { len, max: max_len });
    }

    let message = OutgoingMessage {
        text: text.to_string(),
        user: user.filter(|user| !user.is_empty()).map(str::to_string),
    };
    Ok(serde_json::to_string(&message)?)
}

/// Accepts RFC 3339, naive ISO-8601 date-times (read as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
