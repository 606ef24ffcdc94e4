//! HTTP bulk fetch of every document visible to this client.
//!
//! `GET <scheme>://<address>/v1/settingsMap/<client id>` returns a JSON object
//! mapping document keys (guild ids or `*`) to documents in the same shape as
//! pushed `GUILD_CONFIG_UPDATE` payloads.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Identity;
use crate::errors::{ClientError, Result};

/// Fetch the settings map for `identity`.
#[instrument(skip_all, fields(client_id = %identity.client_id))]
pub async fn fetch_settings_map(
    identity: &Identity,
    http: &reqwest::Client,
) -> Result<HashMap<String, Value>> {
    let url = identity.settings_map_url();
    let mut request = http.get(&url);
    for (name, value) in identity.auth_headers() {
        request = request.header(name, value);
    }

    let response = request.send().await?.error_for_status()?;
    let body: Value = response.json().await?;
    match body {
        Value::Object(map) => {
            debug!(url = %url, documents = map.len(), "settings map fetched");
            Ok(map.into_iter().collect())
        }
        other => Err(ClientError::UnexpectedResponse(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
