use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

use crate::common::ChatMessage;

/// Zone used for the human readable timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeDisplay {
    #[default]
    Utc,
    Local,
}

/// What a presentation layer gets for each received message.
///
/// `author` and `body` are already HTML-escaped, so a sink can inject them
/// into markup as-is. Sinks that draw plain text use `author_text` and
/// `body_text` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRecord {
    pub author: String,
    pub body: String,
    pub author_text: String,
    pub body_text: String,
    /// e.g. "15 January 2024, 02:30 pm", used as the accessible label.
    pub posted_at_label: String,
    /// The label without its first comma, used as visible text.
    pub posted_at_text: String,
    /// Machine-readable UTC timestamp, e.g. "2024-01-15T14:30:00.000Z".
    pub posted_at_iso: String,
}

impl DisplayRecord {
    /// List-item markup for HTML sinks.
    pub fn to_html(&self) -> String {
        format!(
            "<li><span><strong>{}</strong>: {}</span><time datetime=\"{}\" aria-label=\"{}\">{}</time></li>",
            self.author,
            self.body,
            self.posted_at_iso,
            escape_html(&self.posted_at_label),
            escape_html(&self.posted_at_text),
        )
    }
}

pub fn render(message: &ChatMessage, display: TimeDisplay) -> DisplayRecord {
    let posted_at_label = match display {
        TimeDisplay::Utc => format_timestamp(&message.timestamp),
        TimeDisplay::Local => format_timestamp(&message.timestamp.with_timezone(&Local)),
    };
    let posted_at_text = posted_at_label.replacen(',', "", 1);

    DisplayRecord {
        author: escape_html(&message.user),
        body: escape_html(&message.text),
        author_text: message.user.clone(),
        body_text: message.text.clone(),
        posted_at_label,
        posted_at_text,
        posted_at_iso: message
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Day, full month name, year, then a 12-hour clock with lowercase am/pm.
pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp.format("%-d %B %Y, %I:%M %P").to_string()
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
