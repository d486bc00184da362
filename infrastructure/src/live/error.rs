//! Error types for the Live session adapter

use live_application::ports::live_gateway::GatewayError;
use live_domain::SessionState;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Live session operations
pub type Result<T> = std::result::Result<T, LiveError>;

/// Errors that can occur when talking to the Live-Session endpoint
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Connecting to {url} timed out after {}s", .after.as_secs())]
    ConnectTimeout { url: String, after: Duration },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed frame: {0}")]
    Protocol(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Timed out waiting for {what} after {}s", .after.as_secs())]
    Timeout { what: &'static str, after: Duration },

    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },

    #[error("Transport closed")]
    TransportClosed,
}

impl From<LiveError> for GatewayError {
    fn from(error: LiveError) -> Self {
        match error {
            LiveError::ConnectTimeout { after, .. } => GatewayError::ConnectTimeout(after),
            LiveError::Connect { .. } | LiveError::WebSocket(_) => {
                GatewayError::ConnectionError(error.to_string())
            }
            LiveError::Session(message) => GatewayError::SessionError(message),
            LiveError::Timeout { what, after } => GatewayError::Timeout { what, after },
            LiveError::InvalidState { state, .. } => GatewayError::NotActive(state),
            LiveError::TransportClosed => GatewayError::TransportClosed,
            LiveError::SerializationError(_) | LiveError::Protocol(_) => {
                GatewayError::Other(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_gateway_errors() {
        let err: GatewayError = LiveError::ConnectTimeout {
            url: "ws://x".into(),
            after: Duration::from_secs(10),
        }
        .into();
        assert!(matches!(err, GatewayError::ConnectTimeout(d) if d.as_secs() == 10));

        let err: GatewayError = LiveError::Session("quota".into()).into();
        assert!(matches!(err, GatewayError::SessionError(m) if m == "quota"));

        let err: GatewayError = LiveError::InvalidState {
            action: "send",
            state: SessionState::Closed,
        }
        .into();
        assert!(matches!(err, GatewayError::NotActive(SessionState::Closed)));
    }
}
