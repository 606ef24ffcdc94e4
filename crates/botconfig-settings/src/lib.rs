//! # botconfig-settings
//!
//! Settings for the botconfig client, loaded from three layers (in priority
//! order):
//! 1. **Compiled defaults**: [`BotConfigSettings::default()`]
//! 2. **User file**: `~/.botconfig/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `BOTCONFIG_*` overrides (highest priority)
//!
//! Settings are passed explicitly to the client; there is no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
