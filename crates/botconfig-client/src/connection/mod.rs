//! Connection lifecycle actor.
//!
//! One task owns the transport link, heartbeat, backoff and subscription
//! set. Callers talk to it through [`ActorMessage`]s; timers and transport
//! tasks post back into the same task, so every state change is serialized.

mod actor;

use std::sync::Arc;

use botconfig_core::ConfigWriteMode;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::dispatcher::ProtocolDispatcher;
use crate::errors::Result;
use crate::events::{ClientEvent, ConnectionState};
use crate::store::ConfigStore;
use crate::transport::Connector;

pub(crate) use actor::ConnectionActor;

/// Caller request.
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect {
        reconnect: bool,
    },
    AddGuilds(Vec<String>),
    RemoveGuilds(Vec<String>),
    WriteConfig {
        mode: ConfigWriteMode,
        guild_id: String,
        data: Value,
        reply: oneshot::Sender<Result<()>>,
    },
    Subscriptions(oneshot::Sender<Vec<String>>),
    Shutdown,
}

/// Everything the actor processes besides transport events.
#[derive(Debug)]
pub(crate) enum ActorMessage {
    Command(Command),
    /// Heartbeat timer fired for the link of `generation`.
    HeartbeatTick { generation: u64 },
    /// Backoff delay scheduled at `generation` elapsed.
    ReconnectDue { generation: u64 },
}

/// State shared between the actor and client handles.
pub(crate) struct ActorContext {
    pub store: Arc<RwLock<ConfigStore>>,
    pub events: broadcast::Sender<ClientEvent>,
    pub state: watch::Sender<ConnectionState>,
}

/// Running actor.
pub(crate) struct ActorHandle {
    pub inbox: mpsc::UnboundedSender<ActorMessage>,
    pub state: watch::Receiver<ConnectionState>,
    pub join: JoinHandle<()>,
}

/// Spawn the actor on the current runtime.
///
/// The actor stops on [`Command::Shutdown`] or once every strong inbox
/// sender is dropped.
pub(crate) fn spawn(
    config: &ClientConfig,
    connector: Arc<dyn Connector>,
    dispatcher: ProtocolDispatcher,
    store: Arc<RwLock<ConfigStore>>,
    events: broadcast::Sender<ClientEvent>,
) -> ActorHandle {
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let (transport_tx, transport_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

    let context = ActorContext {
        store,
        events,
        state: state_tx,
    };
    let actor = ConnectionActor::new(
        config,
        connector,
        dispatcher,
        context,
        inbox_tx.downgrade(),
        transport_tx,
    );
    let join = tokio::spawn(actor.run(inbox_rx, transport_rx));

    ActorHandle {
        inbox: inbox_tx,
        state: state_rx,
        join,
    }
}
