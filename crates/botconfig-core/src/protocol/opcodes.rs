//! Operation codes and dispatch types.
//!
//! Numeric values are part of the wire contract and must not change.

use std::fmt;

/// Operation code carried in the `op` field of every envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Server push of a named event (`t` field).
    Dispatch,
    /// Client liveness ping.
    Heartbeat,
    /// Client credentials, sent in response to `HELLO`.
    Identify,
    /// Subscribe to updates for a list of guilds.
    RequestGuild,
    /// Unsubscribe from a list of guilds.
    RemoveGuild,
    /// Ask the server to update or replace a guild's configuration.
    UpdateConfig,
    /// Server asks the client for a guild's roles, members and channels.
    GetChannelsUsersAndRoles,
    /// Client answer to `GET_CHANNELS_USERS_AND_ROLES`.
    ResponseChannelsUsersAndRoles,
    /// First server frame, carries the heartbeat interval.
    Hello,
    /// Server acknowledgment of a heartbeat.
    HeartbeatAck,
}

impl OpCode {
    /// All known operation codes.
    pub const ALL: [Self; 10] = [
        Self::Dispatch,
        Self::Heartbeat,
        Self::Identify,
        Self::RequestGuild,
        Self::RemoveGuild,
        Self::UpdateConfig,
        Self::GetChannelsUsersAndRoles,
        Self::ResponseChannelsUsersAndRoles,
        Self::Hello,
        Self::HeartbeatAck,
    ];

    /// Numeric wire value.
    pub const fn code(self) -> u64 {
        match self {
            Self::Dispatch => 0,
            Self::Heartbeat => 1,
            Self::Identify => 2,
            Self::RequestGuild => 3,
            Self::RemoveGuild => 4,
            Self::UpdateConfig => 5,
            Self::GetChannelsUsersAndRoles => 6,
            Self::ResponseChannelsUsersAndRoles => 7,
            Self::Hello => 10,
            Self::HeartbeatAck => 11,
        }
    }

    /// Look up an operation code by wire value. Unknown values yield `None`.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Symbolic protocol name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dispatch => "DISPATCH",
            Self::Heartbeat => "HEARTBEAT",
            Self::Identify => "IDENTIFY",
            Self::RequestGuild => "REQUEST_GUILD",
            Self::RemoveGuild => "REMOVE_GUILD",
            Self::UpdateConfig => "UPDATE_CONFIG",
            Self::GetChannelsUsersAndRoles => "GET_CHANNELS_USERS_AND_ROLES",
            Self::ResponseChannelsUsersAndRoles => "RESPONSE_CHANNELS_USERS_AND_ROLES",
            Self::Hello => "HELLO",
            Self::HeartbeatAck => "HEARTBEAT_ACK",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name carried in the `t` field of a `DISPATCH` envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchType {
    /// Handshake finished; the session is usable.
    Ready,
    /// A guild's configuration document was (re)pushed.
    GuildConfigUpdate,
}

impl DispatchType {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::GuildConfigUpdate => "GUILD_CONFIG_UPDATE",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "READY" => Some(Self::Ready),
            "GUILD_CONFIG_UPDATE" => Some(Self::GuildConfigUpdate),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
