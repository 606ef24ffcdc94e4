//! Client error types.

use botconfig_core::ProtocolError;
use thiserror::Error;

/// Lookup failures from the config cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No value at `path` and the caller asked for a hard failure.
    #[error("missing config key: {path}")]
    MissingConfigKey {
        /// The dotted path that was looked up.
        path: String,
    },
    /// The path was empty or began with an empty segment.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors returned by [`BotConfigClient`](crate::BotConfigClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A write was attempted before the server acknowledged the session.
    #[error("client is not ready")]
    NotReady,
    /// The connection actor has stopped.
    #[error("client is closed")]
    Closed,
    /// Cache lookup failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// HTTP warm-up request failed.
    #[error("warm-up request failed: {0}")]
    Warmup(#[from] reqwest::Error),
    /// Warm-up response was not a JSON object of documents.
    #[error("unexpected warm-up response: {0}")]
    UnexpectedResponse(String),
    /// Outbound envelope could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_key_display() {
        let err = ConfigError::MissingConfigKey {
            path: "42.prefix".into(),
        };
        assert_eq!(err.to_string(), "missing config key: 42.prefix");
    }

    #[test]
    fn config_error_converts() {
        let err: ClientError = ConfigError::InvalidArgument("empty path".into()).into();
        assert_matches!(err, ClientError::Config(ConfigError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "invalid argument: empty path");
    }

    #[test]
    fn not_ready_display() {
        assert_eq!(ClientError::NotReady.to_string(), "client is not ready");
    }
}
