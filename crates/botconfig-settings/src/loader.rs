//! Layered settings loading.
//!
//! [`load_settings_from_path`] builds a [`BotConfigSettings`] from three
//! sources, later ones winning: the compiled defaults, the JSON file (merged
//! key by key with [`deep_merge`]), then `BOTCONFIG_*` environment variables.
//! A `null` in the file leaves the default in place; arrays are taken as-is.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::BotConfigSettings;

const SETTINGS_DIR: &str = ".botconfig";
const SETTINGS_FILE: &str = "settings.json";

/// `$HOME/.botconfig/settings.json`, or under `/tmp` when `HOME` is unset.
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
        .join(SETTINGS_DIR)
        .join(SETTINGS_FILE)
}

/// [`load_settings_from_path`] at [`settings_path`].
pub fn load_settings() -> Result<BotConfigSettings> {
    load_settings_from_path(&settings_path())
}

/// File layer at `path` plus the process environment.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<BotConfigSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Defaults with the file at `path` merged over them. The environment is
/// not consulted.
pub fn load_file_layer(path: &Path) -> Result<BotConfigSettings> {
    let mut merged = serde_json::to_value(BotConfigSettings::default())?;
    if path.exists() {
        debug!(?path, "reading settings file");
        let overlay: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        merged = deep_merge(merged, overlay);
    } else {
        debug!(?path, "no settings file, using defaults");
    }
    Ok(serde_json::from_value(merged)?)
}

/// Merge `overlay` into `base`.
///
/// Objects combine per key, recursing into keys present on both sides.
/// Any other overlay value replaces the base value, except `null`, which
/// is dropped.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut fields), Value::Object(overrides)) => {
            for (key, value) in overrides.into_iter().filter(|(_, v)| !v.is_null()) {
                let value = match fields.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = fields.insert(key, value);
            }
            Value::Object(fields)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Invalid values are ignored with a warning and the file/default value is
/// kept. Empty strings count as unset.
pub fn apply_env_overrides<F>(settings: &mut BotConfigSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Client ──────────────────────────────────────────────────────
    if let Some(v) = env.string("BOTCONFIG_CLIENT_ID") {
        settings.client.id = v;
    }
    if let Some(v) = env.string("BOTCONFIG_TOKEN") {
        settings.client.token = v;
    }
    if let Some(v) = env.string("BOTCONFIG_ADDRESS") {
        settings.client.address = v;
    }
    if let Some(v) = env.bool("BOTCONFIG_SECURE") {
        settings.client.secure = v;
    }
    if let Some(v) = env.string("BOTCONFIG_GUILDS") {
        settings.client.guilds = parse_list(&v);
    }

    // ── Timing ──────────────────────────────────────────────────────
    if let Some(v) = env.u64("BOTCONFIG_HEARTBEAT_INTERVAL", 1000, 600_000) {
        settings.heartbeat.default_interval_ms = v;
    }
    if let Some(v) = env.u64("BOTCONFIG_HEARTBEAT_GRACE", 0, 60_000) {
        settings.heartbeat.stale_grace_ms = v;
    }
    if let Some(v) = env.u64("BOTCONFIG_RECONNECT_MIN_DELAY", 1, 3600) {
        settings.reconnect.min_delay_secs = v;
    }
    if let Some(v) = env.u64("BOTCONFIG_RECONNECT_MAX_DELAY", 1, 3600) {
        settings.reconnect.max_delay_secs = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("BOTCONFIG_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.string("BOTCONFIG_LOG_FORMAT") {
        match serde_json::from_value(Value::String(v.clone())) {
            Ok(format) => settings.logging.format = format,
            Err(_) => {
                tracing::warn!(key = "BOTCONFIG_LOG_FORMAT", value = %v, "invalid log format, ignoring");
            }
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Split a comma separated list, dropping blank entries.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}
