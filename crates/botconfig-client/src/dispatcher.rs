//! Inbound envelope routing.
//!
//! The dispatcher is pure: it reads an [`Envelope`] and returns the
//! [`DispatchAction`]s the connection actor should carry out. Registered
//! [`RpcPassthrough`] handlers see every envelope first.

use std::sync::Arc;
use std::time::Duration;

use botconfig_core::{
    DispatchType, Envelope, HelloPayload, OpCode, RosterProvider, RosterRequestPayload,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Identity;

/// Error text sent when no roster exists for the requested guild.
pub const ROSTER_NOT_FOUND: &str = "guild not found";

/// Error text sent when the client has no roster provider.
pub const ROSTER_UNAVAILABLE: &str = "roster unavailable";

/// Handler that claims envelopes before built-in routing.
pub trait RpcPassthrough: Send + Sync {
    /// Whether this handler takes `envelope`.
    fn matches(&self, envelope: &Envelope) -> bool;

    /// Handle a claimed envelope, optionally producing a reply.
    fn handle(&self, envelope: Envelope) -> Option<Envelope>;
}

/// Side effect requested by the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchAction {
    /// Arm the heartbeat with this interval.
    StartHeartbeat(Duration),
    /// Send an envelope on the current link.
    Send(Envelope),
    /// The session is ready: resync subscriptions, reset backoff, notify.
    MarkReady,
    /// Replace the cached document for `guild_id`.
    StoreConfig {
        /// Document key.
        guild_id: String,
        /// Full pushed document.
        document: Value,
    },
    /// A heartbeat ack arrived.
    RecordAck,
}

/// Routes envelopes by op code and dispatch type.
pub struct ProtocolDispatcher {
    identity: Identity,
    default_interval: Duration,
    roster: Option<Arc<dyn RosterProvider>>,
    passthroughs: Vec<Arc<dyn RpcPassthrough>>,
}

impl ProtocolDispatcher {
    /// Create a dispatcher identifying as `identity`.
    pub fn new(identity: Identity, default_interval: Duration) -> Self {
        Self {
            identity,
            default_interval,
            roster: None,
            passthroughs: Vec::new(),
        }
    }

    /// Answer roster queries with `provider`.
    #[must_use]
    pub fn with_roster(mut self, provider: Arc<dyn RosterProvider>) -> Self {
        self.roster = Some(provider);
        self
    }

    /// Register a passthrough. Earlier registrations win.
    #[must_use]
    pub fn with_passthrough(mut self, handler: Arc<dyn RpcPassthrough>) -> Self {
        self.passthroughs.push(handler);
        self
    }

    /// Route one envelope.
    pub fn dispatch(&self, envelope: Envelope) -> Vec<DispatchAction> {
        if let Some(handler) = self.passthroughs.iter().find(|h| h.matches(&envelope)) {
            debug!(op = envelope.op, "envelope claimed by passthrough");
            return handler
                .handle(envelope)
                .map(DispatchAction::Send)
                .into_iter()
                .collect();
        }

        match envelope.opcode() {
            Some(OpCode::Hello) => self.on_hello(&envelope),
            Some(OpCode::Dispatch) => Self::on_dispatch(envelope),
            Some(OpCode::HeartbeatAck) => vec![DispatchAction::RecordAck],
            Some(OpCode::GetChannelsUsersAndRoles) => self.on_roster_request(&envelope),
            Some(op) => {
                debug!(op = op.as_str(), "ignoring client-bound op code");
                Vec::new()
            }
            None => {
                debug!(op = envelope.op, "ignoring unknown op code");
                Vec::new()
            }
        }
    }

    fn on_hello(&self, envelope: &Envelope) -> Vec<DispatchAction> {
        let interval = envelope
            .payload::<HelloPayload>()
            .ok()
            .and_then(|hello| hello.heartbeat_interval)
            .filter(|ms| *ms > 0)
            .map_or(self.default_interval, Duration::from_millis);
        debug!(?interval, "hello");
        vec![
            DispatchAction::StartHeartbeat(interval),
            DispatchAction::Send(Envelope::identify(
                &self.identity.client_id,
                &self.identity.token,
            )),
        ]
    }

    fn on_dispatch(envelope: Envelope) -> Vec<DispatchAction> {
        match envelope.dispatch_kind() {
            Some(DispatchType::Ready) => vec![DispatchAction::MarkReady],
            Some(DispatchType::GuildConfigUpdate) => {
                let Some(guild_id) = envelope.d.get("id").and_then(Value::as_str) else {
                    warn!("config update without id, dropping");
                    return Vec::new();
                };
                vec![DispatchAction::StoreConfig {
                    guild_id: guild_id.to_owned(),
                    document: envelope.d,
                }]
            }
            None => {
                debug!(t = ?envelope.dispatch_type, "ignoring unknown dispatch type");
                Vec::new()
            }
        }
    }

    fn on_roster_request(&self, envelope: &Envelope) -> Vec<DispatchAction> {
        let nonce = envelope.nonce.clone();
        let guild_id = match envelope.payload::<RosterRequestPayload>() {
            Ok(request) => request.id,
            Err(e) => {
                warn!(error = %e, "roster request without guild id");
                String::new()
            }
        };

        let reply = match &self.roster {
            None => Envelope::roster_error(&guild_id, ROSTER_UNAVAILABLE, nonce),
            Some(provider) => match provider.roster(&guild_id) {
                Some(roster) => Envelope::roster_response(&guild_id, &roster, nonce),
                None => Envelope::roster_error(&guild_id, ROSTER_NOT_FOUND, nonce),
            },
        };
        vec![DispatchAction::Send(reply)]
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use botconfig_core::{ChannelSummary, GuildRoster, MemberSummary};
    use serde_json::json;

    use super::*;

    fn identity() -> Identity {
        Identity {
            client_id: "38383838338".into(),
            token: "tok".into(),
            address: "localhost:8080".into(),
            secure: false,
        }
    }

    fn dispatcher() -> ProtocolDispatcher {
        ProtocolDispatcher::new(identity(), Duration::from_millis(15_000))
    }

    fn decode(frame: &Value) -> Envelope {
        Envelope::decode(&frame.to_string()).unwrap()
    }

    struct OneGuild;

    impl RosterProvider for OneGuild {
        fn roster(&self, guild_id: &str) -> Option<GuildRoster> {
            (guild_id == "42").then(|| GuildRoster {
                roles: Vec::new(),
                users: vec![MemberSummary {
                    id: "u1".into(),
                    username: "alice".into(),
                    nick: None,
                    roles: Vec::new(),
                }],
                channels: vec![ChannelSummary {
                    id: "c1".into(),
                    name: "general".into(),
                    kind: "text".into(),
                    position: 0,
                }],
            })
        }
    }

    struct EchoCustom;

    impl RpcPassthrough for EchoCustom {
        fn matches(&self, envelope: &Envelope) -> bool {
            envelope.op == 100 || envelope.nonce.as_deref() == Some("rpc")
        }

        fn handle(&self, envelope: Envelope) -> Option<Envelope> {
            Some(Envelope::new(OpCode::Dispatch, envelope.d).with_nonce(envelope.nonce))
        }
    }

    #[test]
    fn hello_starts_heartbeat_and_identifies() {
        let actions =
            dispatcher().dispatch(decode(&json!({"op": 10, "d": {"heartbeat_interval": 1000}})));
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], DispatchAction::StartHeartbeat(Duration::from_secs(1)));
        assert_matches!(&actions[1], DispatchAction::Send(env) if env.op == 2 && env.d == json!({"id": "38383838338", "token": "tok"}));
    }

    #[test]
    fn hello_without_interval_uses_default() {
        for frame in [
            json!({"op": 10}),
            json!({"op": 10, "d": {}}),
            json!({"op": 10, "d": {"heartbeat_interval": "soon"}}),
            json!({"op": 10, "d": {"heartbeat_interval": 0}}),
        ] {
            let actions = dispatcher().dispatch(decode(&frame));
            assert_eq!(
                actions[0],
                DispatchAction::StartHeartbeat(Duration::from_millis(15_000)),
                "frame {frame}"
            );
        }
    }

    #[test]
    fn ready_marks_ready() {
        let actions = dispatcher().dispatch(decode(&json!({"op": 0, "t": "READY", "d": {}})));
        assert_eq!(actions, vec![DispatchAction::MarkReady]);
    }

    #[test]
    fn config_update_stores_whole_document() {
        let doc = json!({"id": "42", "data": {"x": 1}});
        let actions = dispatcher().dispatch(decode(
            &json!({"op": 0, "t": "GUILD_CONFIG_UPDATE", "d": doc}),
        ));
        assert_eq!(
            actions,
            vec![DispatchAction::StoreConfig {
                guild_id: "42".into(),
                document: doc,
            }]
        );
    }

    #[test]
    fn config_update_without_id_is_dropped() {
        let actions = dispatcher().dispatch(decode(
            &json!({"op": 0, "t": "GUILD_CONFIG_UPDATE", "d": {"data": {}}}),
        ));
        assert!(actions.is_empty());
    }

    #[test]
    fn ack_records() {
        let actions = dispatcher().dispatch(decode(&json!({"op": 11})));
        assert_eq!(actions, vec![DispatchAction::RecordAck]);
    }

    #[test]
    fn unknown_ops_and_types_are_ignored() {
        let d = dispatcher();
        assert!(d.dispatch(decode(&json!({"op": 99}))).is_empty());
        assert!(d.dispatch(decode(&json!({"op": 0, "t": "SOMETHING_NEW"}))).is_empty());
        assert!(d.dispatch(decode(&json!({"op": 1, "d": 5}))).is_empty());
    }

    #[test]
    fn roster_found() {
        let d = dispatcher().with_roster(Arc::new(OneGuild));
        let actions = d.dispatch(decode(&json!({"op": 6, "d": {"id": "42"}, "nonce": "n-1"})));
        let [DispatchAction::Send(reply)] = actions.as_slice() else {
            panic!("expected one reply, got {actions:?}");
        };
        assert_eq!(reply.op, 7);
        assert_eq!(reply.nonce.as_deref(), Some("n-1"));
        assert_eq!(reply.d["id"], "42");
        assert_eq!(reply.d["users"][0]["username"], "alice");
        assert_eq!(reply.d["channels"][0]["type"], "text");
    }

    #[test]
    fn roster_missing_guild() {
        let d = dispatcher().with_roster(Arc::new(OneGuild));
        let actions = d.dispatch(decode(&json!({"op": 6, "d": {"id": "7"}, "nonce": "n-2"})));
        assert_matches!(
            actions.as_slice(),
            [DispatchAction::Send(reply)] if reply.d == json!({"id": "7", "error": ROSTER_NOT_FOUND}) && reply.nonce.as_deref() == Some("n-2")
        );
    }

    #[test]
    fn roster_without_provider_still_answers() {
        let actions = dispatcher().dispatch(decode(&json!({"op": 6, "d": {"id": "42"}})));
        assert_matches!(
            actions.as_slice(),
            [DispatchAction::Send(reply)] if reply.d["error"] == ROSTER_UNAVAILABLE
        );
    }

    #[test]
    fn passthrough_takes_precedence() {
        let d = dispatcher().with_passthrough(Arc::new(EchoCustom));
        let actions = d.dispatch(decode(&json!({"op": 0, "t": "READY", "nonce": "rpc", "d": 1})));
        assert_matches!(
            actions.as_slice(),
            [DispatchAction::Send(reply)] if reply.nonce.as_deref() == Some("rpc") && reply.d == json!(1)
        );

        let custom = d.dispatch(decode(&json!({"op": 100, "d": "x"})));
        assert_eq!(custom.len(), 1);

        let normal = d.dispatch(decode(&json!({"op": 11})));
        assert_eq!(normal, vec![DispatchAction::RecordAck]);
    }
}
