use crate::common::ConnectionState;

/// Things that happen to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    HandshakeSucceeded,
    HandshakeFailed,
    /// Close frame received, or the local side asked to close.
    Closed,
    TransportError,
    /// A new connection attempt after a failure.
    Reconnect,
}

impl ConnectionState {
    /// Next state for `event`, or `None` when the event does not apply here.
    pub fn next(self, event: Lifecycle) -> Option<ConnectionState> {
        use ConnectionState::*;
        use Lifecycle::*;

        match (self, event) {
            (Connecting, HandshakeSucceeded) => Some(Open),
            (Connecting, HandshakeFailed) => Some(Failed),
            (Connecting, Lifecycle::Closed) => Some(ConnectionState::Closed),
            (Open, Lifecycle::Closed) => Some(ConnectionState::Closed),
            (Open, TransportError) => Some(Failed),
            (Failed, Reconnect) => Some(Connecting),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let state = ConnectionState::Connecting;
        let state = state.next(Lifecycle::HandshakeSucceeded).unwrap();
        assert_eq!(state, ConnectionState::Open);
        assert_eq!(
            state.next(Lifecycle::Closed),
            Some(ConnectionState::Closed)
        );
    }

    #[test]
    fn failures() {
        assert_eq!(
            ConnectionState::Connecting.next(Lifecycle::HandshakeFailed),
            Some(ConnectionState::Failed)
        );
        assert_eq!(
            ConnectionState::Open.next(Lifecycle::TransportError),
            Some(ConnectionState::Failed)
        );
        assert_eq!(
            ConnectionState::Failed.next(Lifecycle::Reconnect),
            Some(ConnectionState::Connecting)
        );
    }

    #[test]
    fn closed_is_final() {
        for event in [
            Lifecycle::HandshakeSucceeded,
            Lifecycle::HandshakeFailed,
            Lifecycle::Closed,
            Lifecycle::TransportError,
            Lifecycle::Reconnect,
        ] {
            assert_eq!(ConnectionState::Closed.next(event), None);
        }
    }

    #[test]
    fn illegal_events_are_ignored() {
        assert_eq!(ConnectionState::Open.next(Lifecycle::HandshakeSucceeded), None);
        assert_eq!(ConnectionState::Open.next(Lifecycle::Reconnect), None);
        assert_eq!(ConnectionState::Connecting.next(Lifecycle::TransportError), None);
        assert_eq!(ConnectionState::Failed.next(Lifecycle::Closed), None);
    }
}
