//! Guild roster summaries returned for `GET_CHANNELS_USERS_AND_ROLES`.
//!
//! The roster itself lives in whatever bot framework embeds this client; the
//! client only needs a synchronous lookup through [`RosterProvider`].

use serde::{Deserialize, Serialize};

/// A role as reported to the configuration server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    /// Role ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// RGB color as an integer.
    pub color: u32,
    /// Sort position in the role list.
    pub position: i64,
}

/// A guild member as reported to the configuration server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    /// User ID.
    pub id: String,
    /// Account username.
    pub username: String,
    /// Guild nickname, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    /// IDs of the roles held by this member.
    pub roles: Vec<String>,
}

/// A channel as reported to the configuration server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Channel ID.
    pub id: String,
    /// Channel name.
    pub name: String,
    /// Channel kind (e.g. `"text"`, `"voice"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Sort position.
    pub position: i64,
}

/// Everything the server asks for about one guild.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRoster {
    /// Roles.
    pub roles: Vec<RoleSummary>,
    /// Members.
    pub users: Vec<MemberSummary>,
    /// Channels.
    pub channels: Vec<ChannelSummary>,
}

/// Lookup of guild rosters, supplied by the embedding bot.
pub trait RosterProvider: Send + Sync {
    /// Roster for `guild_id`, or `None` if the bot does not know the guild.
    fn roster(&self, guild_id: &str) -> Option<GuildRoster>;
}
