//! The session core: one connection's state, its render sink, and the
//! outbound handle the presentation layer holds.

pub mod render;
pub mod state;
pub mod throttle;
pub mod wire;

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::common::{ChatMessage, ConnectionState, RenderSink, SessionCommand, SessionStatus};
use crate::config::AppConfig;
use crate::error::SessionError;

use render::TimeDisplay;
use state::Lifecycle;
use throttle::SendThrottle;

/// Inbound half of a session. Owned by the connection task.
pub struct Session {
    id: Uuid,
    state: ConnectionState,
    attempt: u32,
    time_display: TimeDisplay,
    sink: Box<dyn RenderSink>,
    status: watch::Sender<SessionStatus>,
}

impl Session {
    pub fn new(
        id: Uuid,
        time_display: TimeDisplay,
        sink: Box<dyn RenderSink>,
        status: watch::Sender<SessionStatus>,
    ) -> Self {
        Self {
            id,
            state: ConnectionState::Connecting,
            attempt: 0,
            time_display,
            sink,
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Applies a lifecycle event and publishes the resulting status.
    pub fn apply(&mut self, event: Lifecycle, detail: Option<String>) -> ConnectionState {
        let Some(next) = self.state.next(event) else {
            log::debug!(
                "[session {}] ignoring {:?} while {}",
                self.id,
                event,
                self.state
            );
            return self.state;
        };

        match event {
            Lifecycle::Reconnect => self.attempt += 1,
            Lifecycle::HandshakeSucceeded => self.attempt = 0,
            _ => {}
        }
        match &detail {
            Some(reason) => log::info!("[session {}] {} -> {} ({reason})", self.id, self.state, next),
            None => log::info!("[session {}] {} -> {}", self.id, self.state, next),
        }

        self.state = next;
        self.status.send_replace(SessionStatus {
            state: next,
            attempt: self.attempt,
            detail,
        });
        next
    }

    /// Decodes one inbound frame and hands the rendered record to the sink.
    /// Nothing is rendered when the frame is rejected.
    pub fn on_message(&mut self, raw: &str) -> Result<ChatMessage, SessionError> {
        let message = wire::decode_inbound(raw)?;
        self.sink.append(render::render(&message, self.time_display));
        Ok(message)
    }
}

/// Outbound half of a session, held by the presentation layer. Dropping it
/// closes the connection.
pub struct SessionHandle {
    id: Uuid,
    identity: Option<String>,
    max_message_len: usize,
    throttle: SendThrottle,
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: Uuid,
        config: &AppConfig,
        commands: mpsc::Sender<SessionCommand>,
        status: watch::Receiver<SessionStatus>,
    ) -> Self {
        Self {
            id,
            identity: config.username.clone().filter(|name| !name.trim().is_empty()),
            max_message_len: config.max_message_len,
            throttle: SendThrottle::new(
                config.rate_limit.max_sends,
                Duration::from_millis(config.rate_limit.window_ms),
            ),
            commands,
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Validates and queues one message. `user` falls back to the configured
    /// identity; with neither, the field is left out of the frame.
    pub fn send(&mut self, text: &str, user: Option<&str>) -> Result<(), SessionError> {
        let user = user
            .filter(|name| !name.trim().is_empty())
            .or(self.identity.as_deref());
        let payload = wire::encode_outgoing(text, user, self.max_message_len)?;

        if self.state() != ConnectionState::Open {
            return Err(SessionError::NotConnected);
        }
        if !self.throttle.try_acquire(Instant::now()) {
            return Err(SessionError::RateLimited);
        }

        match self.commands.try_send(SessionCommand::Transmit(payload)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.throttle.release_last();
                Err(SessionError::RateLimited)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.throttle.release_last();
                log::warn!("[session {}] send after the connection task ended", self.id);
                Err(SessionError::NotConnected)
            }
        }
    }

    /// Asks the connection task to close. Safe to call more than once.
    pub fn close(&self) {
        match self.commands.try_send(SessionCommand::Close) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(command)) => {
                // Queued sends go out first, then the close.
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    log::warn!("[session {}] command queue full, close request dropped", self.id);
                    return;
                };
                log::debug!("[session {}] command queue full, close deferred", self.id);
                let commands = self.commands.clone();
                let id = self.id;
                runtime.spawn(async move {
                    if commands.send(command).await.is_err() {
                        log::debug!("[session {id}] close requested, task already gone");
                    }
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("[session {}] close requested, task already gone", self.id);
            }
        }
    }

    /// Waits for the connection task to finish and returns its final status.
    pub async fn ended(&mut self) -> SessionStatus {
        while self.status.changed().await.is_ok() {}
        self.status.borrow().clone()
    }

    /// Waits until the published status satisfies `done`, or the task ends.
    pub async fn wait_until(
        &mut self,
        done: impl FnMut(&SessionStatus) -> bool,
    ) -> SessionStatus {
        if let Ok(status) = self.status.wait_for(done).await {
            return status.clone();
        }
        self.status.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::session::render::DisplayRecord;

    fn recording_session() -> (Session, Arc<Mutex<Vec<DisplayRecord>>>, watch::Receiver<SessionStatus>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink_records = Arc::clone(&records);
        let (status_tx, status_rx) = watch::channel(SessionStatus::connecting());
        let session = Session::new(
            Uuid::new_v4(),
            TimeDisplay::Utc,
            Box::new(move |record: DisplayRecord| sink_records.lock().unwrap().push(record)),
            status_tx,
        );
        (session, records, status_rx)
    }

    fn handle_in(state: ConnectionState) -> (SessionHandle, mpsc::Receiver<SessionCommand>) {
        handle_with_queue(state, 16)
    }

    fn handle_with_queue(
        state: ConnectionState,
        capacity: usize,
    ) -> (SessionHandle, mpsc::Receiver<SessionCommand>) {
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (_status_tx, status_rx) = watch::channel(SessionStatus {
            state,
            attempt: 0,
            detail: None,
        });
        let config = AppConfig {
            username: Some("carol".to_string()),
            ..AppConfig::default()
        };
        let handle = SessionHandle::new(Uuid::new_v4(), &config, command_tx, status_rx);
        (handle, command_rx)
    }

    fn transmitted(commands: &mut mpsc::Receiver<SessionCommand>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(command) = commands.try_recv() {
            if let SessionCommand::Transmit(payload) = command {
                out.push(payload);
            }
        }
        out
    }

    #[test]
    fn valid_messages_render_in_arrival_order() {
        let (mut session, records, _status) = recording_session();
        // Deliberately out of timestamp order.
        let frames = [
            r#"{"text":"third","user":"a","timestamp":"2024-01-15T14:32:00Z"}"#,
            r#"{"text":"first","timestamp":"2024-01-15T14:30:00Z"}"#,
            r#"{"text":"second","user":"b","timestamp":"2024-01-15T14:31:00Z"}"#,
        ];
        for frame in frames {
            session.on_message(frame).unwrap();
        }

        let records = records.lock().unwrap();
        let bodies: Vec<&str> = records.iter().map(|r| r.body.as_str()).collect();
        assert_eq!(bodies, ["third", "first", "second"]);
        assert_eq!(records[1].author, "anon");
    }

    #[test]
    fn malformed_frames_are_not_rendered() {
        let (mut session, records, _status) = recording_session();
        session
            .on_message(r#"{"text":"ok","timestamp":"2024-01-15T14:30:00Z"}"#)
            .unwrap();

        let err = session.on_message(r#"{"text": "hi"}"#).unwrap_err();
        assert!(matches!(err, SessionError::MalformedMessage(_)));
        assert!(session.on_message("not json").is_err());

        session
            .on_message(r#"{"text":"still here","timestamp":"2024-01-15T14:31:00Z"}"#)
            .unwrap();
        assert_eq!(records.lock().unwrap().len(), 2);
    }

    #[test]
    fn lifecycle_is_published() {
        let (mut session, _records, status) = recording_session();
        assert_eq!(session.apply(Lifecycle::HandshakeSucceeded, None), ConnectionState::Open);
        assert_eq!(status.borrow().state, ConnectionState::Open);

        session.apply(Lifecycle::TransportError, Some("reset by peer".to_string()));
        assert_eq!(status.borrow().state, ConnectionState::Failed);
        assert_eq!(status.borrow().detail.as_deref(), Some("reset by peer"));

        session.apply(Lifecycle::Reconnect, None);
        assert_eq!(status.borrow().state, ConnectionState::Connecting);
        assert_eq!(status.borrow().attempt, 1);
    }

    #[test]
    fn ignored_events_leave_state_alone() {
        let (mut session, _records, status) = recording_session();
        session.apply(Lifecycle::HandshakeSucceeded, None);
        session.apply(Lifecycle::Closed, None);
        assert_eq!(session.apply(Lifecycle::Reconnect, None), ConnectionState::Closed);
        assert_eq!(status.borrow().state, ConnectionState::Closed);
    }

    #[test]
    fn empty_sends_never_transmit() {
        let (mut handle, mut commands) = handle_in(ConnectionState::Open);
        assert_eq!(handle.send("", None), Err(SessionError::EmptyMessage));
        assert_eq!(handle.send("   ", None), Err(SessionError::EmptyMessage));
        assert!(transmitted(&mut commands).is_empty());
    }

    #[test]
    fn empty_check_comes_before_connection_check() {
        let (mut handle, _commands) = handle_in(ConnectionState::Connecting);
        assert_eq!(handle.send(" ", None), Err(SessionError::EmptyMessage));
        assert_eq!(handle.send("hi", None), Err(SessionError::NotConnected));
    }

    #[test]
    fn send_uses_explicit_user_then_configured_identity() {
        let (mut handle, mut commands) = handle_in(ConnectionState::Open);
        handle.send("hello", Some("alice")).unwrap();
        handle.send("hello again", None).unwrap();
        handle.send("blank user", Some("  ")).unwrap();

        assert_eq!(
            transmitted(&mut commands),
            [
                r#"{"text":"hello","user":"alice"}"#,
                r#"{"text":"hello again","user":"carol"}"#,
                r#"{"text":"blank user","user":"carol"}"#,
            ]
        );
    }

    #[test]
    fn rapid_sends_are_rate_limited() {
        let (mut handle, mut commands) = handle_in(ConnectionState::Open);
        for i in 0..5 {
            handle.send(&format!("msg {i}"), None).unwrap();
        }
        assert_eq!(handle.send("one too many", None), Err(SessionError::RateLimited));
        assert_eq!(transmitted(&mut commands).len(), 5);
    }

    #[test]
    fn send_after_task_exit_is_not_connected() {
        let (mut handle, commands) = handle_in(ConnectionState::Open);
        drop(commands);
        assert_eq!(handle.send("hi", None), Err(SessionError::NotConnected));
    }

    #[tokio::test]
    async fn close_waits_behind_a_full_queue() {
        let (mut handle, mut commands) = handle_with_queue(ConnectionState::Open, 1);
        handle.send("fills the queue", None).unwrap();
        handle.close();

        assert!(matches!(commands.recv().await, Some(SessionCommand::Transmit(_))));
        let next = tokio::time::timeout(Duration::from_secs(5), commands.recv())
            .await
            .unwrap();
        assert!(matches!(next, Some(SessionCommand::Close)));
    }
}
