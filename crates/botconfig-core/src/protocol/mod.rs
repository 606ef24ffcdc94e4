//! Wire protocol spoken with the configuration server.
//!
//! Every frame is a JSON [`Envelope`] tagged with an [`OpCode`]. `DISPATCH`
//! envelopes additionally carry a [`DispatchType`] in their `t` field.

pub mod envelope;
pub mod opcodes;
pub mod payloads;

pub use envelope::Envelope;
pub use opcodes::{DispatchType, OpCode};
pub use payloads::{
    ConfigWriteMode, GuildListPayload, HelloPayload, IdentifyPayload, RosterRequestPayload,
    UpdateConfigPayload,
};
