//! Notifications published to callers.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// Lifecycle of the connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No link is open.
    #[default]
    Disconnected,
    /// A link is opening or open but the handshake has not completed.
    Connecting,
    /// The server sent `READY`.
    Ready,
}

impl ConnectionState {
    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event broadcast by the client.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// The handshake completed and subscriptions were sent.
    Ready,
    /// A configuration document was pushed; carries the full document.
    ConfigUpdated(Value),
    /// A transport error. The connection state is unchanged.
    Error(String),
    /// The link went down. `reconnect_in` is set when a retry is scheduled.
    Disconnected {
        /// Delay before the scheduled reconnect.
        reconnect_in: Option<Duration>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display_and_serialize() {
        assert_eq!(ConnectionState::Ready.to_string(), "ready");
        assert_eq!(
            serde_json::to_value(ConnectionState::Connecting).unwrap(),
            "connecting"
        );
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
