//! # botconfig
//!
//! Command-line client for a botconfig server. `watch` keeps a live
//! connection open and prints pushed documents; `get` bulk-fetches the
//! settings map over HTTP and prints one lookup.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use botconfig_client::{BotConfigClient, ClientConfig, ClientEvent, LookupOptions};
use botconfig_core::logging::{LogFormat, init_subscriber};
use botconfig_settings::BotConfigSettings;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// botconfig protocol client.
#[derive(Parser, Debug)]
#[command(name = "botconfig", about = "botconfig protocol client")]
struct Cli {
    /// Settings file (defaults to `~/.botconfig/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Server `host[:port]`.
    #[arg(long, global = true)]
    address: Option<String>,

    /// Client identifier.
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Authentication token.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Use `wss`/`https`.
    #[arg(long, global = true)]
    secure: bool,

    /// Log filter when `RUST_LOG` is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect, subscribe, and print config updates until Ctrl-C.
    Watch {
        /// Guild ids to subscribe to, in addition to the configured ones.
        #[arg(long = "guild", value_delimiter = ',')]
        guilds: Vec<String>,
    },
    /// Fetch the settings map and print the value at a dotted path.
    Get {
        /// Dotted path, e.g. `42.modules.music`.
        path: String,

        /// Value to print on a miss. Parsed as JSON, else taken as a string.
        #[arg(long)]
        fallback: Option<String>,

        /// Fail when the path does not resolve.
        #[arg(long)]
        strict: bool,
    },
}

impl Cli {
    /// Layer command-line flags over loaded settings.
    fn apply_overrides(&self, settings: &mut BotConfigSettings) {
        if let Some(ref address) = self.address {
            settings.client.address.clone_from(address);
        }
        if let Some(ref id) = self.client_id {
            settings.client.id.clone_from(id);
        }
        if let Some(ref token) = self.token {
            settings.client.token.clone_from(token);
        }
        if self.secure {
            settings.client.secure = true;
        }
        if let Some(ref level) = self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.json_logs {
            settings.logging.format = LogFormat::Json;
        }
    }

    fn load_settings(&self) -> Result<BotConfigSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(botconfig_settings::settings_path);
        let mut settings = botconfig_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        self.apply_overrides(&mut settings);
        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }
}

fn lookup_options(fallback: Option<&str>, strict: bool) -> LookupOptions {
    LookupOptions {
        fallback: fallback.map(|raw| {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
        }),
        fail_on_miss: strict,
    }
}

async fn watch(client: BotConfigClient, guilds: Vec<String>) -> Result<()> {
    let mut events = client.subscribe_events();
    client.add_guilds(guilds)?;
    client.connect()?;
    info!(address = %client.config().identity.address, "connecting");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(ClientEvent::Ready) => {
                    let guilds = client.subscriptions().await?;
                    info!(guilds = guilds.len(), "ready");
                }
                Ok(ClientEvent::ConfigUpdated(document)) => {
                    info!(id = %document["id"], "config updated");
                    println!("{document}");
                }
                Ok(ClientEvent::Error(message)) => warn!(error = %message, "transport error"),
                Ok(ClientEvent::Disconnected { reconnect_in }) => {
                    warn!(?reconnect_in, "disconnected");
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.shutdown().await;
    Ok(())
}

async fn get(client: &BotConfigClient, path: &str, options: &LookupOptions) -> Result<()> {
    let count = client
        .warm_up()
        .await
        .context("Failed to fetch settings map")?;
    info!(documents = count, "settings map loaded");

    match client.get(path, options)? {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => bail!("no value at {path}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    init_subscriber(&settings.logging.level, settings.logging.format);

    let client = BotConfigClient::new(ClientConfig::from_settings(&settings));
    match cli.command {
        Command::Watch { guilds } => watch(client, guilds).await,
        Command::Get {
            path,
            fallback,
            strict,
        } => get(&client, &path, &lookup_options(fallback.as_deref(), strict)).await,
    }
}
