use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::SessionError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub type ChatSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Only `ws://` and `wss://` endpoints are accepted.
pub fn parse_endpoint(raw: &str) -> Result<Url, SessionError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| SessionError::InvalidEndpoint(format!("{raw}: {err}")))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(SessionError::InvalidEndpoint(format!(
            "{raw}: unsupported scheme `{other}`"
        ))),
    }
}

/// Opens the socket and completes the WebSocket handshake.
pub async fn open(endpoint: &Url) -> Result<ChatSocket, SessionError> {
    let handshake = connect_async(endpoint.as_str());
    let (socket, response) = tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake)
        .await
        .map_err(|_| {
            SessionError::ConnectionFailed(format!(
                "handshake timed out after {}s",
                HANDSHAKE_TIMEOUT.as_secs()
            ))
        })??;
    log::debug!("Handshake with {endpoint} answered {}", response.status());
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_websocket_urls() {
        assert!(parse_endpoint("ws://localhost:8000/ws").is_ok());
        assert!(parse_endpoint("wss://chat.example.com/ws").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(
            parse_endpoint("http://localhost:8000/ws"),
            Err(SessionError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            parse_endpoint("localhost:8000"),
            Err(SessionError::InvalidEndpoint(_))
        ));
        assert!(matches!(parse_endpoint(""), Err(SessionError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn refused_connection_is_connection_failed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = parse_endpoint(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
        assert!(matches!(
            open(&endpoint).await,
            Err(SessionError::ConnectionFailed(_))
        ));
    }
}
