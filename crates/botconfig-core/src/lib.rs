//! # botconfig-core
//!
//! Shared vocabulary for the botconfig client crates:
//!
//! - **Protocol**: [`Envelope`], [`OpCode`], [`DispatchType`] and the typed
//!   payloads exchanged with the configuration server
//! - **Roster**: guild role/member/channel summaries and the
//!   [`RosterProvider`] seam used to answer roster queries
//! - **Errors**: [`ProtocolError`] via `thiserror`
//! - **Logging**: `tracing` subscriber setup and test capture helpers

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;
pub mod protocol;
pub mod roster;

pub use errors::ProtocolError;
pub use protocol::{
    ConfigWriteMode, DispatchType, Envelope, GuildListPayload, HelloPayload, IdentifyPayload,
    OpCode, RosterRequestPayload, UpdateConfigPayload,
};
pub use roster::{ChannelSummary, GuildRoster, MemberSummary, RoleSummary, RosterProvider};
