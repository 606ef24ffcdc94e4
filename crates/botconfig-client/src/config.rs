//! Client configuration.

use std::time::Duration;

use botconfig_settings::BotConfigSettings;

/// Path of the WebSocket endpoint on the server.
pub const WEBSOCKET_PATH: &str = "/botconfig/v1/ws";

/// Path prefix of the bulk settings endpoint; the client id is appended.
pub const SETTINGS_MAP_PATH: &str = "/v1/settingsMap";

/// Who the client is and where it connects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Client identifier.
    pub client_id: String,
    /// Authentication token.
    pub token: String,
    /// Server `host[:port]`.
    pub address: String,
    /// Use TLS.
    pub secure: bool,
}

impl Identity {
    /// `ws://` or `wss://` URL of the protocol endpoint.
    pub fn websocket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{WEBSOCKET_PATH}", self.address)
    }

    /// `http://` or `https://` URL of this client's settings map.
    pub fn settings_map_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!(
            "{scheme}://{}{SETTINGS_MAP_PATH}/{}",
            self.address, self.client_id
        )
    }

    /// Headers sent on both the WebSocket upgrade and HTTP requests.
    pub fn auth_headers(&self) -> [(&'static str, &str); 2] {
        [("token", &self.token), ("id", &self.client_id)]
    }
}

/// Runtime configuration for [`BotConfigClient`](crate::BotConfigClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Identity and target.
    pub identity: Identity,
    /// Heartbeat interval used when `HELLO` does not provide one.
    pub default_heartbeat_interval: Duration,
    /// Slack on top of two heartbeat intervals before the link counts as stale.
    pub stale_grace: Duration,
    /// Lower backoff bound in seconds.
    pub min_reconnect_delay_secs: u64,
    /// Upper backoff bound in seconds.
    pub max_reconnect_delay_secs: u64,
    /// Guilds subscribed before the first connect.
    pub initial_guilds: Vec<String>,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl ClientConfig {
    /// Defaults for everything except identity.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            default_heartbeat_interval: Duration::from_millis(15_000),
            stale_grace: Duration::from_millis(200),
            min_reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 5,
            initial_guilds: Vec::new(),
            event_capacity: 256,
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &BotConfigSettings) -> Self {
        let identity = Identity {
            client_id: settings.client.id.clone(),
            token: settings.client.token.clone(),
            address: settings.client.address.clone(),
            secure: settings.client.secure,
        };
        Self {
            default_heartbeat_interval: Duration::from_millis(
                settings.heartbeat.default_interval_ms,
            ),
            stale_grace: Duration::from_millis(settings.heartbeat.stale_grace_ms),
            min_reconnect_delay_secs: settings.reconnect.min_delay_secs,
            max_reconnect_delay_secs: settings.reconnect.max_delay_secs,
            initial_guilds: settings.client.guilds.clone(),
            ..Self::new(identity)
        }
    }
}
