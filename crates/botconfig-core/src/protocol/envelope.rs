//! The envelope: unit of exchange over the connection.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::opcodes::{DispatchType, OpCode};
use super::payloads::{ConfigWriteMode, GuildListPayload, IdentifyPayload, UpdateConfigPayload};
use crate::errors::{ProtocolError, Result};
use crate::roster::GuildRoster;

/// Wire message `{op, d, t?, nonce?}`.
///
/// `op` is kept as the raw number so frames with operation codes this client
/// does not know still decode; use [`Envelope::opcode`] to classify them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Raw operation code.
    pub op: u64,
    /// Payload.
    #[serde(default)]
    pub d: Value,
    /// Dispatch event name, only present on `DISPATCH`.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub dispatch_type: Option<String>,
    /// Correlation token echoed back in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl Envelope {
    /// Build an envelope for `op` with payload `d`.
    pub fn new(op: OpCode, d: Value) -> Self {
        Self {
            op: op.code(),
            d,
            dispatch_type: None,
            nonce: None,
        }
    }

    /// Build a `DISPATCH` envelope of the given type.
    pub fn dispatch(kind: DispatchType, d: Value) -> Self {
        Self {
            dispatch_type: Some(kind.as_str().to_owned()),
            ..Self::new(OpCode::Dispatch, d)
        }
    }

    /// Attach a nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: Option<String>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Known operation code, or `None` for codes this client does not handle.
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_code(self.op)
    }

    /// Known dispatch type, or `None` when absent or unrecognized.
    pub fn dispatch_kind(&self) -> Option<DispatchType> {
        self.dispatch_type.as_deref().and_then(DispatchType::parse)
    }

    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// Encode to a text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Deserialize the payload into `T`, reporting the op on failure.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.d.clone()).map_err(|e| ProtocolError::InvalidPayload {
            op: self.opcode().map_or("UNKNOWN", OpCode::as_str),
            reason: e.to_string(),
        })
    }

    // ── Outbound builders ───────────────────────────────────────────────

    /// `IDENTIFY {id, token}`.
    pub fn identify(client_id: &str, token: &str) -> Self {
        let payload = IdentifyPayload {
            id: client_id.to_owned(),
            token: token.to_owned(),
        };
        Self::new(OpCode::Identify, json!(payload))
    }

    /// `HEARTBEAT <unix millis>`.
    pub fn heartbeat(timestamp_ms: i64) -> Self {
        Self::new(OpCode::Heartbeat, json!(timestamp_ms))
    }

    /// `REQUEST_GUILD {guilds}`.
    pub fn request_guilds(guilds: Vec<String>) -> Self {
        Self::new(OpCode::RequestGuild, json!(GuildListPayload { guilds }))
    }

    /// `REMOVE_GUILD {guilds}`.
    pub fn remove_guilds(guilds: Vec<String>) -> Self {
        Self::new(OpCode::RemoveGuild, json!(GuildListPayload { guilds }))
    }

    /// `UPDATE_CONFIG {o, id, data}`.
    pub fn update_config(mode: ConfigWriteMode, guild_id: &str, data: Value) -> Self {
        let payload = UpdateConfigPayload {
            o: mode,
            id: guild_id.to_owned(),
            data,
        };
        Self::new(OpCode::UpdateConfig, json!(payload))
    }

    /// Successful `RESPONSE_CHANNELS_USERS_AND_ROLES`.
    pub fn roster_response(guild_id: &str, roster: &GuildRoster, nonce: Option<String>) -> Self {
        Self::new(
            OpCode::ResponseChannelsUsersAndRoles,
            json!({
                "id": guild_id,
                "roles": roster.roles,
                "users": roster.users,
                "channels": roster.channels,
            }),
        )
        .with_nonce(nonce)
    }

    /// Failed `RESPONSE_CHANNELS_USERS_AND_ROLES`, carrying `error` instead of data.
    pub fn roster_error(guild_id: &str, error: &str, nonce: Option<String>) -> Self {
        Self::new(
            OpCode::ResponseChannelsUsersAndRoles,
            json!({ "id": guild_id, "error": error }),
        )
        .with_nonce(nonce)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::roster::RoleSummary;

    #[test]
    fn decode_minimal_frame() {
        let env = Envelope::decode(r#"{"op": 11}"#).unwrap();
        assert_eq!(env.opcode(), Some(OpCode::HeartbeatAck));
        assert!(env.d.is_null());
        assert!(env.nonce.is_none());
    }

    #[test]
    fn decode_dispatch_frame() {
        let env = Envelope::decode(
            r#"{"op": 0, "t": "GUILD_CONFIG_UPDATE", "d": {"id": "42", "data": {"x": 1}}}"#,
        )
        .unwrap();
        assert_eq!(env.opcode(), Some(OpCode::Dispatch));
        assert_eq!(env.dispatch_kind(), Some(DispatchType::GuildConfigUpdate));
        assert_eq!(env.d["data"]["x"], 1);
    }

    #[test]
    fn decode_unknown_opcode_still_succeeds() {
        let env = Envelope::decode(r#"{"op": 77, "d": "future"}"#).unwrap();
        assert_eq!(env.op, 77);
        assert_eq!(env.opcode(), None);
    }

    #[test]
    fn decode_garbage_is_malformed() {
        assert_matches!(Envelope::decode("not json"), Err(ProtocolError::Malformed(_)));
        assert_matches!(Envelope::decode(r#"{"d": 1}"#), Err(ProtocolError::Malformed(_)));
        assert_matches!(Envelope::decode(r#"{"op": "one"}"#), Err(ProtocolError::Malformed(_)));
    }

    #[test]
    fn encode_omits_absent_fields() {
        let text = Envelope::heartbeat(1_700_000_000_000).encode().unwrap();
        assert_eq!(text, r#"{"op":1,"d":1700000000000}"#);
    }

    #[test]
    fn identify_shape() {
        let env = Envelope::identify("38383838338", "secret");
        assert_eq!(env.op, 2);
        assert_eq!(env.d, json!({"id": "38383838338", "token": "secret"}));
    }

    #[test]
    fn dispatch_sets_type() {
        let env = Envelope::dispatch(DispatchType::Ready, Value::Null);
        let text = env.encode().unwrap();
        assert!(text.contains(r#""t":"READY""#));
    }

    #[test]
    fn roster_response_echoes_nonce() {
        let roster = GuildRoster {
            roles: vec![RoleSummary {
                id: "r1".into(),
                name: "admin".into(),
                color: 0xff_00_00,
                position: 3,
            }],
            users: Vec::new(),
            channels: Vec::new(),
        };
        let env = Envelope::roster_response("42", &roster, Some("n-1".into()));
        assert_eq!(env.opcode(), Some(OpCode::ResponseChannelsUsersAndRoles));
        assert_eq!(env.nonce.as_deref(), Some("n-1"));
        assert_eq!(env.d["roles"][0]["name"], "admin");
        assert!(env.d.get("error").is_none());
    }

    #[test]
    fn roster_error_carries_error_field() {
        let env = Envelope::roster_error("42", "guild not found", Some("n-2".into()));
        assert_eq!(env.d, json!({"id": "42", "error": "guild not found"}));
        assert_eq!(env.nonce.as_deref(), Some("n-2"));
    }

    #[test]
    fn payload_reports_op_on_mismatch() {
        let env = Envelope::new(OpCode::RequestGuild, json!({"guilds": "nope"}));
        let err = env.payload::<GuildListPayload>().unwrap_err();
        assert_matches!(err, ProtocolError::InvalidPayload { op: "REQUEST_GUILD", .. });
    }
}
