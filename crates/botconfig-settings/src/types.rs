//! Settings types.

use botconfig_core::logging::LogFormat;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfigSettings {
    /// Identity and server address.
    pub client: ClientSettings,
    /// Heartbeat timing.
    pub heartbeat: HeartbeatSettings,
    /// Reconnect backoff bounds.
    pub reconnect: ReconnectSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl BotConfigSettings {
    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.client.id.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "client.id must not be empty".into(),
            ));
        }
        if self.client.address.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "client.address must not be empty".into(),
            ));
        }
        if self.heartbeat.default_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "heartbeat.defaultIntervalMs must be positive".into(),
            ));
        }
        if self.reconnect.min_delay_secs == 0
            || self.reconnect.min_delay_secs > self.reconnect.max_delay_secs
        {
            return Err(SettingsError::InvalidValue(format!(
                "reconnect delay bounds [{}, {}] are not a valid range",
                self.reconnect.min_delay_secs, self.reconnect.max_delay_secs
            )));
        }
        Ok(())
    }
}

/// Client identity and connection target.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Client identifier sent in `IDENTIFY` and the `id` header.
    pub id: String,
    /// Authentication token.
    pub token: String,
    /// Server `host[:port]`, without scheme.
    pub address: String,
    /// Use `wss`/`https` instead of `ws`/`http`.
    pub secure: bool,
    /// Guilds to subscribe to on startup.
    pub guilds: Vec<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            token: String::new(),
            address: "localhost:8080".to_string(),
            secure: false,
            guilds: Vec::new(),
        }
    }
}

/// Heartbeat timing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartbeatSettings {
    /// Interval used when `HELLO` does not carry one, in milliseconds.
    pub default_interval_ms: u64,
    /// Slack added to the two-interval staleness threshold, in milliseconds.
    pub stale_grace_ms: u64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            default_interval_ms: 15_000,
            stale_grace_ms: 200,
        }
    }
}

/// Reconnect backoff bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectSettings {
    /// First delay after a fresh disconnect, in seconds.
    pub min_delay_secs: u64,
    /// Ceiling for the doubling delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            min_delay_secs: 1,
            max_delay_secs: 5,
        }
    }
}

/// Log output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
