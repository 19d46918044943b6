use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use uuid::Uuid;

use crate::common::{RenderSink, SessionCommand, SessionStatus};
use crate::config::{AppConfig, ReconnectConfig};
use crate::error::SessionError;
use crate::session::state::Lifecycle;
use crate::session::{Session, SessionHandle};

use super::backoff::BackoffState;
use super::transport::{self, ChatSocket};

/// How long to wait for the peer's half of the closing handshake.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// How one open connection ended.
enum Outcome {
    ClosedLocally,
    ClosedRemotely(Option<String>),
    Failed(String),
}

/// The connection task. Owns the socket, the session core and its sink.
pub struct SessionClient {
    session: Session,
    endpoint: Url,
    reconnect: ReconnectConfig,
    command_receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionClient {
    /// Starts a session against `config.endpoint`. The returned handle reports
    /// `Connecting` until the handshake resolves.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        config: AppConfig,
        sink: impl RenderSink + 'static,
    ) -> Result<SessionHandle, SessionError> {
        let endpoint = transport::parse_endpoint(&config.endpoint)?;
        let id = Uuid::new_v4();

        let (command_tx, command_rx) = mpsc::channel(100);
        let (status_tx, status_rx) = watch::channel(SessionStatus::connecting());

        let handle = SessionHandle::new(id, &config, command_tx, status_rx);
        let client = SessionClient {
            session: Session::new(id, config.time_display, Box::new(sink), status_tx),
            endpoint,
            reconnect: config.reconnect,
            command_receiver: command_rx,
        };
        tokio::spawn(client.run());

        Ok(handle)
    }

    async fn run(mut self) {
        let id = self.session.id();
        let mut backoff = BackoffState::new(&self.reconnect);
        log::info!("[session {id}] connecting to {}", self.endpoint);

        loop {
            let opened = tokio::select! {
                opened = transport::open(&self.endpoint) => opened,
                () = close_requested(&mut self.command_receiver) => {
                    self.session.apply(Lifecycle::Closed, None);
                    break;
                }
            };

            let failure = match opened {
                Ok(socket) => {
                    self.session.apply(Lifecycle::HandshakeSucceeded, None);
                    backoff.reset();

                    match self.pump(socket).await {
                        Outcome::ClosedLocally => {
                            self.session.apply(Lifecycle::Closed, None);
                            break;
                        }
                        Outcome::ClosedRemotely(reason) => {
                            self.session.apply(Lifecycle::Closed, reason);
                            break;
                        }
                        Outcome::Failed(reason) => {
                            log::warn!("[session {id}] transport error: {reason}");
                            self.session
                                .apply(Lifecycle::TransportError, Some(reason.clone()));
                            reason
                        }
                    }
                }
                Err(err) => {
                    log::warn!("[session {id}] {err}");
                    let reason = err.to_string();
                    self.session
                        .apply(Lifecycle::HandshakeFailed, Some(reason.clone()));
                    reason
                }
            };

            if !self.reconnect.enabled {
                break;
            }
            let Some(delay) = backoff.next_delay() else {
                log::error!(
                    "[session {id}] giving up after {} reconnect attempts",
                    backoff.max_attempts()
                );
                break;
            };

            log::info!(
                "[session {id}] reconnect attempt {} of {}, waiting {}ms",
                backoff.attempts(),
                backoff.max_attempts(),
                delay.as_millis()
            );
            self.session.apply(
                Lifecycle::Reconnect,
                Some(format!("{failure}; retrying in {}s", delay.as_secs_f32())),
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = close_requested(&mut self.command_receiver) => {
                    log::info!("[session {id}] reconnection cancelled");
                    self.session.apply(Lifecycle::Closed, None);
                    break;
                }
            }
        }

        log::info!("[session {id}] ended in state {}", self.session.state());
    }

    /// Moves frames in both directions until the connection ends.
    async fn pump(&mut self, socket: ChatSocket) -> Outcome {
        let id = self.session.id();
        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => match command {
                    Some(SessionCommand::Transmit(payload)) => {
                        if let Err(err) = write.send(Message::text(payload)).await {
                            return Outcome::Failed(err.to_string());
                        }
                    }
                    Some(SessionCommand::Close) | None => {
                        if let Err(err) = write.send(Message::Close(None)).await {
                            log::debug!("[session {id}] close frame not delivered: {err}");
                        } else {
                            finish_close(id, &mut read).await;
                        }
                        return Outcome::ClosedLocally;
                    }
                },
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(err) = self.session.on_message(&text) {
                            log::warn!("[session {id}] discarding inbound frame: {err}");
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame.map(|frame| {
                            format!("closed by server ({}) {}", u16::from(frame.code), &*frame.reason)
                        });
                        // The reply is only queued until the socket is flushed.
                        if let Err(err) = write.flush().await {
                            log::debug!("[session {id}] close reply not delivered: {err}");
                        }
                        finish_close(id, &mut read).await;
                        return Outcome::ClosedRemotely(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Outcome::Failed(err.to_string()),
                    None => return Outcome::Failed("connection dropped".to_string()),
                },
            }
        }
    }
}

/// Reads until the peer ends the stream, so the closing handshake completes
/// before the socket is dropped. Frames read here are discarded.
async fn finish_close(id: Uuid, read: &mut SplitStream<ChatSocket>) {
    let drain = async { while let Some(Ok(_)) = read.next().await {} };
    if tokio::time::timeout(CLOSE_GRACE, drain).await.is_err() {
        log::debug!("[session {id}] peer did not finish the closing handshake");
    }
}

/// Resolves once the handle asks to close or is dropped. Transmit commands
/// that arrive while no socket is open are dropped.
async fn close_requested(commands: &mut mpsc::Receiver<SessionCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            SessionCommand::Close => return,
            SessionCommand::Transmit(_) => {
                log::warn!("Dropping outbound message queued while disconnected");
            }
        }
    }
}
