//! Public client handle.

use std::sync::Arc;

use botconfig_core::{ConfigWriteMode, RosterProvider};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ClientConfig;
use crate::connection::{self, ActorMessage, Command};
use crate::dispatcher::{ProtocolDispatcher, RpcPassthrough};
use crate::errors::{ClientError, Result};
use crate::events::{ClientEvent, ConnectionState};
use crate::store::{ConfigStore, LookupOptions};
use crate::transport::{Connector, WsConnector};
use crate::warmup;

/// Builder for [`BotConfigClient`].
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    roster: Option<Arc<dyn RosterProvider>>,
    passthroughs: Vec<Arc<dyn RpcPassthrough>>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Answer roster queries from `provider`.
    #[must_use]
    pub fn roster(mut self, provider: Arc<dyn RosterProvider>) -> Self {
        self.roster = Some(provider);
        self
    }

    /// Route matching envelopes to `handler` before built-in handling.
    #[must_use]
    pub fn passthrough(mut self, handler: Arc<dyn RpcPassthrough>) -> Self {
        self.passthroughs.push(handler);
        self
    }

    /// Replace the WebSocket connector.
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// HTTP client used for [`BotConfigClient::warm_up`].
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Spawn the connection actor. Must be called inside a tokio runtime.
    /// The client starts disconnected.
    pub fn build(self) -> BotConfigClient {
        let mut dispatcher = ProtocolDispatcher::new(
            self.config.identity.clone(),
            self.config.default_heartbeat_interval,
        );
        if let Some(roster) = self.roster {
            dispatcher = dispatcher.with_roster(roster);
        }
        for handler in self.passthroughs {
            dispatcher = dispatcher.with_passthrough(handler);
        }

        let store = Arc::new(RwLock::new(ConfigStore::new()));
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));
        let actor = connection::spawn(
            &self.config,
            self.connector,
            dispatcher,
            store.clone(),
            events.clone(),
        );

        BotConfigClient {
            inner: Arc::new(ClientShared {
                config: self.config,
                commands: actor.inbox,
                state: actor.state,
                events,
                store,
                http: self.http.unwrap_or_default(),
                actor: Mutex::new(Some(actor.join)),
            }),
        }
    }
}

struct ClientShared {
    config: ClientConfig,
    commands: mpsc::UnboundedSender<ActorMessage>,
    state: watch::Receiver<ConnectionState>,
    events: broadcast::Sender<ClientEvent>,
    store: Arc<RwLock<ConfigStore>>,
    http: reqwest::Client,
    actor: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to a botconfig connection. Cheap to clone.
///
/// Dropping the last handle shuts the connection down.
#[derive(Clone)]
pub struct BotConfigClient {
    inner: Arc<ClientShared>,
}

impl BotConfigClient {
    /// Start building a client.
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            connector: Arc::new(WsConnector),
            roster: None,
            passthroughs: Vec::new(),
            http: None,
        }
    }

    /// Client with the default WebSocket connector and no roster provider.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn command(&self, command: Command) -> Result<()> {
        self.inner
            .commands
            .send(ActorMessage::Command(command))
            .map_err(|_| ClientError::Closed)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Open a new connection, dropping the current one first.
    pub fn connect(&self) -> Result<()> {
        self.command(Command::Connect)
    }

    /// Close the connection. With `reconnect`, a retry is scheduled after the
    /// next backoff delay. Calling this while disconnected is a no-op.
    pub fn disconnect(&self, reconnect: bool) -> Result<()> {
        self.command(Command::Disconnect { reconnect })
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Watch connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.clone()
    }

    /// Subscribe to client events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Resolve once the connection is ready.
    pub async fn wait_until_ready(&self) -> Result<()> {
        let mut state = self.inner.state.clone();
        let _ = state
            .wait_for(|s| *s == ConnectionState::Ready)
            .await
            .map_err(|_| ClientError::Closed)?;
        Ok(())
    }

    /// Disconnect without reconnecting and stop the actor.
    pub async fn shutdown(&self) {
        let _ = self.command(Command::Shutdown);
        let handle = self.inner.actor.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!(client_id = %self.inner.config.identity.client_id, "client shut down");
    }

    // ── Subscriptions ───────────────────────────────────────────────────

    /// Subscribe to one guild.
    pub fn add_guild(&self, guild_id: impl Into<String>) -> Result<()> {
        self.add_guilds([guild_id.into()])
    }

    /// Subscribe to several guilds. Sent immediately when ready, otherwise
    /// on the next ready handshake.
    pub fn add_guilds(&self, guild_ids: impl IntoIterator<Item = String>) -> Result<()> {
        self.command(Command::AddGuilds(guild_ids.into_iter().collect()))
    }

    /// Unsubscribe from one guild.
    pub fn remove_guild(&self, guild_id: impl Into<String>) -> Result<()> {
        self.remove_guilds([guild_id.into()])
    }

    /// Unsubscribe from several guilds.
    pub fn remove_guilds(&self, guild_ids: impl IntoIterator<Item = String>) -> Result<()> {
        self.command(Command::RemoveGuilds(guild_ids.into_iter().collect()))
    }

    /// Sorted subscribed guild ids.
    pub async fn subscriptions(&self) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Subscriptions(reply))?;
        rx.await.map_err(|_| ClientError::Closed)
    }

    // ── Config ──────────────────────────────────────────────────────────

    /// Ask the server to merge `data` into the guild's config.
    ///
    /// The local cache changes only when the server pushes the result.
    pub async fn update_config(&self, guild_id: &str, data: Value) -> Result<()> {
        self.write_config(ConfigWriteMode::Update, guild_id, data)
            .await
    }

    /// Ask the server to replace the guild's config with `data`.
    pub async fn replace_config(&self, guild_id: &str, data: Value) -> Result<()> {
        self.write_config(ConfigWriteMode::Replace, guild_id, data)
            .await
    }

    async fn write_config(&self, mode: ConfigWriteMode, guild_id: &str, data: Value) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::WriteConfig {
            mode,
            guild_id: guild_id.to_owned(),
            data,
            reply,
        })?;
        rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Cached document for a guild id or `*`.
    pub fn get_config(&self, id: &str) -> Option<Value> {
        self.inner.store.read().get(id)
    }

    /// Dotted lookup in the cache, e.g. `"42.prefix"`.
    ///
    /// Lookup failures come back as [`ClientError::Config`].
    pub fn get(&self, path: &str, options: &LookupOptions) -> Result<Option<Value>> {
        Ok(self.inner.store.read().get_path(path, options)?)
    }

    /// Fill the cache from the HTTP settings map. Returns the number of
    /// documents loaded.
    pub async fn warm_up(&self) -> Result<usize> {
        let documents =
            warmup::fetch_settings_map(&self.inner.config.identity, &self.inner.http).await?;
        let count = self.inner.store.write().load(documents);
        info!(documents = count, "cache warmed up");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Identity;
    use crate::errors::ConfigError;
    use crate::transport::TransportEvent;
    use crate::transport::mock::MockConnector;

    fn config(address: String) -> ClientConfig {
        ClientConfig::new(Identity {
            client_id: "38383838338".into(),
            token: "tok".into(),
            address,
            secure: false,
        })
    }

    fn client(connector: &MockConnector) -> BotConfigClient {
        BotConfigClient::builder(config("localhost:8080".into()))
            .connector(Arc::new(connector.clone()))
            .build()
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let client = client(&MockConnector::default());
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.get_config("42").is_none());
    }

    #[tokio::test]
    async fn full_round_trip_through_handle() {
        let connector = MockConnector::default();
        let client = client(&connector);
        let mut events = client.subscribe_events();

        client.add_guild("42").unwrap();
        client.connect().unwrap();
        settle().await;

        let link = connector.last();
        link.emit(TransportEvent::Opened);
        link.push(&json!({"op": 10, "d": {"heartbeat_interval": 15_000}}));
        link.push(&json!({"op": 0, "t": "READY"}));
        tokio::time::timeout(Duration::from_secs(1), client.wait_until_ready())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(events.recv().await.unwrap(), ClientEvent::Ready);

        link.push(&json!({"op": 0, "t": "GUILD_CONFIG_UPDATE", "d": {"id": "42", "data": {"x": 1}}}));
        assert_matches!(events.recv().await.unwrap(), ClientEvent::ConfigUpdated(_));
        assert_eq!(
            client.get("42.x", &LookupOptions::default()).unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            client.get_config("42"),
            Some(json!({"id": "42", "data": {"x": 1}}))
        );

        client.update_config("42", json!({"x": 2})).await.unwrap();
        assert_eq!(link.sent_with_op(5).len(), 1);
        assert_eq!(client.subscriptions().await.unwrap(), vec!["42"]);
    }

    #[tokio::test]
    async fn writes_fail_when_not_ready() {
        let client = client(&MockConnector::default());
        assert_matches!(
            client.replace_config("42", json!({})).await,
            Err(ClientError::NotReady)
        );
    }

    #[tokio::test]
    async fn lookup_errors_surface() {
        let client = client(&MockConnector::default());
        assert_matches!(
            client.get("", &LookupOptions::default()),
            Err(ClientError::Config(ConfigError::InvalidArgument(_)))
        );
        assert_matches!(
            client.get("42.x", &LookupOptions::strict()),
            Err(ClientError::Config(ConfigError::MissingConfigKey { path: missing })) if missing == "42.x"
        );
    }

    #[tokio::test]
    async fn shutdown_closes_handle() {
        let connector = MockConnector::default();
        let client = client(&connector);
        client.connect().unwrap();
        settle().await;

        client.shutdown().await;
        assert!(connector.last().is_closed());
        assert_matches!(client.connect(), Err(ClientError::Closed));
        assert_matches!(client.wait_until_ready().await, Err(ClientError::Closed));
    }

    #[tokio::test]
    async fn dropping_last_handle_stops_actor() {
        let connector = MockConnector::default();
        let client = client(&connector);
        let mut state = client.watch_state();
        client.connect().unwrap();
        settle().await;

        drop(client);
        let stopped = tokio::time::timeout(Duration::from_secs(1), state.wait_for(|_| false))
            .await
            .unwrap()
            .is_err();
        assert!(stopped);
        assert!(connector.last().is_closed());
    }

    #[tokio::test]
    async fn warm_up_fills_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/settingsMap/38383838338"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "*": {"id": "*", "data": {"prefix": "!"}},
            })))
            .mount(&server)
            .await;

        let client = BotConfigClient::builder(config(server.address().to_string()))
            .connector(Arc::new(MockConnector::default()))
            .build();
        assert_eq!(client.warm_up().await.unwrap(), 1);
        assert_eq!(
            client.get("*.prefix", &LookupOptions::strict()).unwrap(),
            Some(json!("!"))
        );
    }
}
