use crate::error::SessionError;
use crate::session::render::DisplayRecord;

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub records: Vec<DisplayRecord>,
    pub input_text: String,
    pub username_input: String,
    /// Last send failure, shown under the input bar.
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(username: Option<String>) -> Self {
        Self {
            records: Vec::new(),
            input_text: String::new(),
            username_input: username.unwrap_or_default(),
            notice: None,
        }
    }

    pub fn push_record(&mut self, record: DisplayRecord) {
        self.records.push(record);
    }

    pub fn username(&self) -> Option<&str> {
        Some(self.username_input.trim()).filter(|name| !name.is_empty())
    }

    /// The input is only cleared once the session accepted the message.
    pub fn commit_send(&mut self, result: Result<(), SessionError>) {
        match result {
            Ok(()) => {
                self.input_text.clear();
                self.notice = None;
            }
            Err(err) => {
                log::warn!("Message not sent: {err}");
                self.notice = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_send_clears_input() {
        let mut state = AppState::new(None);
        state.input_text = "hello".to_string();
        state.notice = Some("old failure".to_string());

        state.commit_send(Ok(()));
        assert!(state.input_text.is_empty());
        assert_eq!(state.notice, None);
    }

    #[test]
    fn failed_send_keeps_input() {
        let mut state = AppState::new(None);
        state.input_text = "hello".to_string();

        state.commit_send(Err(SessionError::NotConnected));
        assert_eq!(state.input_text, "hello");
        assert_eq!(state.notice.as_deref(), Some("not connected"));
    }

    #[test]
    fn blank_username_is_none() {
        let mut state = AppState::new(Some("alice".to_string()));
        assert_eq!(state.username(), Some("alice"));
        state.username_input = "   ".to_string();
        assert_eq!(state.username(), None);
    }
}
