//! Live gateway port
//!
//! Defines the interface for opening and driving a Live session.

use async_trait::async_trait;
use live_domain::{ReplyOutcome, SessionConfig, SessionHandle, SessionState, Turn};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during Live gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Connection timed out after {}s", .0.as_secs())]
    ConnectTimeout(Duration),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Session is not active (state: {0})")]
    NotActive(SessionState),

    #[error("Timed out waiting for {what} after {}s", .after.as_secs())]
    Timeout { what: &'static str, after: Duration },

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether the connection is gone and the user must reconnect.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::ConnectionError(_)
                | GatewayError::ConnectTimeout(_)
                | GatewayError::TransportClosed
                | GatewayError::NotActive(_)
                | GatewayError::SessionError(_)
        )
    }
}

/// Gateway for Live sessions
///
/// Each call opens a fresh connection carrying exactly one session. Switching
/// models or clearing server-side state therefore means opening a new one.
#[async_trait]
pub trait LiveGateway: Send + Sync {
    /// Connect and negotiate a session; returns once it is active.
    async fn open_session(
        &self,
        config: &SessionConfig,
    ) -> Result<Box<dyn LiveSession>, GatewayError>;
}

/// An active Live session
#[async_trait]
pub trait LiveSession: Send + Sync {
    /// Server-issued identifiers, cleared on disconnect.
    fn handle(&self) -> Option<SessionHandle>;

    fn state(&self) -> SessionState;

    /// Send one complete user turn.
    async fn send_turn(&self, turn: &Turn) -> Result<(), GatewayError>;

    /// Wait for the next assembler outcome, bounded by `timeout`.
    async fn next_outcome(&self, timeout: Duration) -> Result<ReplyOutcome, GatewayError>;

    /// Take every outcome already queued without waiting.
    async fn drain_outcomes(&self) -> Vec<ReplyOutcome>;

    /// Close the connection. Idempotent.
    async fn disconnect(&self);
}
