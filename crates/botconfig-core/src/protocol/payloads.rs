//! Typed `d` payloads for the operation codes the client produces or reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `HELLO` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval proposed by the server, in milliseconds.
    #[serde(default)]
    pub heartbeat_interval: Option<u64>,
}

/// `IDENTIFY` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Client identifier.
    pub id: String,
    /// Authentication token.
    pub token: String,
}

/// `REQUEST_GUILD` / `REMOVE_GUILD` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildListPayload {
    /// Guild identifiers.
    pub guilds: Vec<String>,
}

/// Whether an `UPDATE_CONFIG` request merges into or replaces the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigWriteMode {
    /// Merge the supplied data into the existing document.
    Update,
    /// Replace the existing document with the supplied data.
    Replace,
}

impl ConfigWriteMode {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Replace => "replace",
        }
    }
}

/// `UPDATE_CONFIG` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfigPayload {
    /// Write mode.
    pub o: ConfigWriteMode,
    /// Guild identifier (or `"*"` for the base document).
    pub id: String,
    /// New configuration data.
    pub data: Value,
}

/// `GET_CHANNELS_USERS_AND_ROLES` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRequestPayload {
    /// Guild the server is asking about.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn hello_without_interval() {
        let hello: HelloPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(hello.heartbeat_interval, None);
    }

    #[test]
    fn hello_with_interval() {
        let hello: HelloPayload =
            serde_json::from_value(json!({"heartbeat_interval": 41250})).unwrap();
        assert_eq!(hello.heartbeat_interval, Some(41_250));
    }

    #[test]
    fn write_mode_serializes_lowercase() {
        let payload = UpdateConfigPayload {
            o: ConfigWriteMode::Replace,
            id: "42".into(),
            data: json!({"prefix": "!"}),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"o": "replace", "id": "42", "data": {"prefix": "!"}}));
        assert_eq!(ConfigWriteMode::Update.as_str(), "update");
    }

    #[test]
    fn guild_list_shape() {
        let payload = GuildListPayload {
            guilds: vec!["1".into(), "2".into()],
        };
        assert_eq!(serde_json::to_value(payload).unwrap(), json!({"guilds": ["1", "2"]}));
    }
}
