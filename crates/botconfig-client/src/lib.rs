//! # botconfig-client
//!
//! Long-lived client for the botconfig protocol. It keeps one WebSocket
//! connection to the configuration server and does the following:
//!
//! - **Handshake**: answers `HELLO` with `IDENTIFY` and becomes ready on `READY`
//! - **Heartbeat**: pings every interval and reconnects when acks stop
//! - **Reconnect**: backs off 1, 2, 4, 5, 5, ... seconds between attempts
//! - **Subscriptions**: tracks guild ids and resyncs the full set on every ready
//! - **Cache**: stores pushed config documents with dotted-path lookups
//! - **Roster**: answers channel/user/role queries through a [`RosterProvider`]
//!
//! [`BotConfigClient`] is the entry point. Its state lives in a single actor
//! task; the handle only sends commands and reads the shared cache.
//!
//! [`RosterProvider`]: botconfig_core::RosterProvider

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub(crate) mod connection;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod heartbeat;
pub mod reconnect;
pub mod store;
pub mod subscriptions;
pub mod transport;
pub mod warmup;

pub use client::{BotConfigClient, ClientBuilder};
pub use config::{ClientConfig, Identity};
pub use dispatcher::RpcPassthrough;
pub use errors::{ClientError, ConfigError, Result};
pub use events::{ClientEvent, ConnectionState};
pub use store::{ConfigStore, LookupOptions, WILDCARD_KEY};
