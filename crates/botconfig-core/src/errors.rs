//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding wire envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The inbound frame was not a valid envelope.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// An outbound envelope could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    /// The envelope was well formed but its payload did not match the shape
    /// expected for its operation code.
    #[error("invalid {op} payload: {reason}")]
    InvalidPayload {
        /// Symbolic name of the operation code.
        op: &'static str,
        /// What was wrong with the payload.
        reason: String,
    },
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err = ProtocolError::Malformed(json_err);
        assert!(err.to_string().starts_with("malformed frame:"));
    }

    #[test]
    fn invalid_payload_display() {
        let err = ProtocolError::InvalidPayload {
            op: "HELLO",
            reason: "missing heartbeat_interval".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid HELLO payload: missing heartbeat_interval"
        );
    }
}
