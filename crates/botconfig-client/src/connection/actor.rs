use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use botconfig_core::Envelope;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

use super::{ActorContext, ActorMessage, Command};
use crate::config::{ClientConfig, Identity};
use crate::dispatcher::{DispatchAction, ProtocolDispatcher};
use crate::errors::{ClientError, Result};
use crate::events::{ClientEvent, ConnectionState};
use crate::heartbeat::HeartbeatMonitor;
use crate::reconnect::ReconnectPolicy;
use crate::subscriptions::SubscriptionSet;
use crate::transport::{
    ConnectRequest, Connector, TaggedEvent, TransportEvent, TransportLink, TransportSink,
};

/// The connection state machine.
///
/// `generation` increases on every connect and every disconnect. Transport
/// events, heartbeat ticks and reconnect deadlines carry the generation they
/// were created under and are ignored once it is no longer current.
pub(crate) struct ConnectionActor {
    identity: Identity,
    connector: Arc<dyn Connector>,
    dispatcher: ProtocolDispatcher,
    context: ActorContext,
    subscriptions: SubscriptionSet,
    heartbeat: HeartbeatMonitor,
    reconnect: ReconnectPolicy,
    generation: u64,
    link: Option<Box<dyn TransportLink>>,
    pending_reconnect: Option<JoinHandle<()>>,
    inbox: mpsc::WeakUnboundedSender<ActorMessage>,
    transport_tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl ConnectionActor {
    pub(crate) fn new(
        config: &ClientConfig,
        connector: Arc<dyn Connector>,
        dispatcher: ProtocolDispatcher,
        context: ActorContext,
        inbox: mpsc::WeakUnboundedSender<ActorMessage>,
        transport_tx: mpsc::UnboundedSender<TaggedEvent>,
    ) -> Self {
        Self {
            identity: config.identity.clone(),
            connector,
            dispatcher,
            context,
            subscriptions: SubscriptionSet::new(config.initial_guilds.iter().cloned()),
            heartbeat: HeartbeatMonitor::new(config.default_heartbeat_interval, config.stale_grace),
            reconnect: ReconnectPolicy::new(
                config.min_reconnect_delay_secs,
                config.max_reconnect_delay_secs,
            ),
            generation: 0,
            link: None,
            pending_reconnect: None,
            inbox,
            transport_tx,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<ActorMessage>,
        mut transport: mpsc::UnboundedReceiver<TaggedEvent>,
    ) {
        loop {
            tokio::select! {
                message = inbox.recv() => {
                    let Some(message) = message else { break };
                    if self.handle_message(message).is_break() {
                        break;
                    }
                }
                Some(event) = transport.recv() => self.handle_transport(event),
            }
        }
        self.disconnect(false);
        debug!("connection actor stopped");
    }

    pub(crate) fn handle_message(&mut self, message: ActorMessage) -> ControlFlow<()> {
        match message {
            ActorMessage::Command(command) => return self.handle_command(command),
            ActorMessage::HeartbeatTick { generation } => self.on_heartbeat_tick(generation),
            ActorMessage::ReconnectDue { generation } => {
                if generation == self.generation && self.state() == ConnectionState::Disconnected
                {
                    self.pending_reconnect = None;
                    self.connect();
                } else {
                    trace!(generation, current = self.generation, "stale reconnect ignored");
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Connect => self.connect(),
            Command::Disconnect { reconnect } => self.disconnect(reconnect),
            Command::AddGuilds(ids) => {
                let ready = self.is_ready();
                if let Some(delta) = self.subscriptions.add(ids, ready) {
                    let _ = self.send(&delta);
                }
            }
            Command::RemoveGuilds(ids) => {
                let ready = self.is_ready();
                if let Some(delta) = self.subscriptions.remove(ids, ready) {
                    let _ = self.send(&delta);
                }
            }
            Command::WriteConfig {
                mode,
                guild_id,
                data,
                reply,
            } => {
                let result = if self.is_ready() {
                    debug!(guild_id = %guild_id, mode = mode.as_str(), "writing config");
                    self.send(&Envelope::update_config(mode, &guild_id, data))
                } else {
                    Err(ClientError::NotReady)
                };
                let _ = reply.send(result);
            }
            Command::Subscriptions(reply) => {
                let _ = reply.send(self.subscriptions.to_vec());
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub(crate) fn handle_transport(&mut self, tagged: TaggedEvent) {
        let TaggedEvent { generation, event } = tagged;
        if generation != self.generation {
            trace!(generation, current = self.generation, "event from stale link ignored");
            return;
        }
        match event {
            TransportEvent::Opened => {
                debug!(generation, "transport open");
                self.reconnect.reset();
            }
            TransportEvent::Message(text) => self.on_frame(&text),
            TransportEvent::Error(message) => {
                warn!(generation, error = %message, "transport error");
                self.emit(ClientEvent::Error(message));
            }
            TransportEvent::Closed => {
                info!(generation, "transport closed");
                self.disconnect(true);
            }
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    fn connect(&mut self) {
        if self.state() != ConnectionState::Disconnected {
            self.disconnect(false);
        }
        self.cancel_pending_reconnect();

        self.generation += 1;
        let generation = self.generation;
        let request = ConnectRequest {
            url: self.identity.websocket_url(),
            headers: self
                .identity
                .auth_headers()
                .iter()
                .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
                .collect(),
        };
        info!(generation, url = %request.url, "connecting");

        self.set_state(ConnectionState::Connecting);
        let sink = TransportSink::new(generation, self.transport_tx.clone());
        self.link = Some(self.connector.open(request, sink));
    }

    fn disconnect(&mut self, reconnect: bool) {
        self.generation += 1;
        self.heartbeat.stop();
        self.cancel_pending_reconnect();

        let was_connected = self.state() != ConnectionState::Disconnected;
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        self.set_state(ConnectionState::Disconnected);

        let reconnect_in = reconnect.then(|| self.schedule_reconnect());
        if was_connected || reconnect_in.is_some() {
            info!(
                generation = self.generation,
                delay_secs = reconnect_in.map(|d| d.as_secs()),
                "disconnected"
            );
            self.emit(ClientEvent::Disconnected { reconnect_in });
        }
    }

    fn schedule_reconnect(&mut self) -> Duration {
        let delay = self.reconnect.next_delay();
        let generation = self.generation;
        let inbox = self.inbox.clone();
        self.pending_reconnect = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox.send(ActorMessage::ReconnectDue { generation });
            }
        }));
        delay
    }

    fn cancel_pending_reconnect(&mut self) {
        if let Some(pending) = self.pending_reconnect.take() {
            pending.abort();
        }
    }

    // ── Heartbeat ───────────────────────────────────────────────────────

    fn start_heartbeat(&mut self, interval: Duration) {
        let generation = self.generation;
        let inbox = self.inbox.clone();
        self.heartbeat.start(interval, move || {
            inbox.upgrade().is_some_and(|inbox| {
                inbox
                    .send(ActorMessage::HeartbeatTick { generation })
                    .is_ok()
            })
        });
    }

    fn on_heartbeat_tick(&mut self, generation: u64) {
        if generation != self.generation || !self.heartbeat.is_active() {
            return;
        }
        if self.heartbeat.is_stale(Instant::now()) {
            warn!(
                generation,
                stale_after = ?self.heartbeat.stale_after(),
                "heartbeat ack overdue, reconnecting"
            );
            self.disconnect(true);
            return;
        }
        let _ = self.send(&Envelope::heartbeat(Utc::now().timestamp_millis()));
    }

    // ── Inbound ─────────────────────────────────────────────────────────

    fn on_frame(&mut self, text: &str) {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(generation = self.generation, error = %e, "dropping malformed frame");
                return;
            }
        };
        trace!(op = envelope.op, t = ?envelope.dispatch_type, "frame received");
        for action in self.dispatcher.dispatch(envelope) {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: DispatchAction) {
        match action {
            DispatchAction::StartHeartbeat(interval) => self.start_heartbeat(interval),
            DispatchAction::Send(envelope) => {
                let _ = self.send(&envelope);
            }
            DispatchAction::MarkReady => {
                let resync = self.subscriptions.resync();
                let _ = self.send(&resync);
                self.reconnect.reset();
                if !self.heartbeat.is_active() {
                    let interval = self.heartbeat.default_interval();
                    debug!(
                        generation = self.generation,
                        ?interval,
                        "ready before hello, arming heartbeat"
                    );
                    self.start_heartbeat(interval);
                }
                self.set_state(ConnectionState::Ready);
                info!(
                    generation = self.generation,
                    guilds = self.subscriptions.len(),
                    "ready"
                );
                self.emit(ClientEvent::Ready);
            }
            DispatchAction::StoreConfig { guild_id, document } => {
                debug!(guild_id = %guild_id, "config updated");
                let _ = self
                    .context
                    .store
                    .write()
                    .replace(guild_id, document.clone());
                self.emit(ClientEvent::ConfigUpdated(document));
            }
            DispatchAction::RecordAck => self.heartbeat.record_ack(Instant::now()),
        }
    }

    // ── Outbound ────────────────────────────────────────────────────────

    fn send(&self, envelope: &Envelope) -> Result<()> {
        let text = envelope.encode().map_err(|e| {
            warn!(op = envelope.op, error = %e, "failed to encode envelope");
            e
        })?;
        let Some(link) = &self.link else {
            debug!(op = envelope.op, "no link, dropping outbound envelope");
            return Err(ClientError::NotReady);
        };
        if !link.send(text) {
            debug!(op = envelope.op, "link refused outbound envelope");
            return Err(ClientError::NotReady);
        }
        trace!(op = envelope.op, "sent");
        Ok(())
    }

    fn emit(&self, event: ClientEvent) {
        // No receivers is fine
        let _ = self.context.events.send(event);
    }

    fn state(&self) -> ConnectionState {
        *self.context.state.borrow()
    }

    fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.context.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "state changed");
        }
    }
}
