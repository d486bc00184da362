//! Application-level configuration.
//!
//! Timeouts and attachment settings that control how use cases behave.

use live_domain::MediaPolicy;
use std::time::Duration;

/// Storage backend requested for uploads when none is configured.
pub const DEFAULT_STORAGE_METHOD: &str = "google-file-api";

/// Bounds for every wait the client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveTimeouts {
    /// WebSocket handshake.
    pub connect: Duration,
    /// Wait for `session_created` after `create_session`.
    pub session_ack: Duration,
    /// Wait for a reply to complete after a turn is sent.
    pub reply: Duration,
}

impl Default for LiveTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            session_ack: Duration::from_secs(10),
            reply: Duration::from_secs(30),
        }
    }
}

impl LiveTimeouts {
    pub fn from_seconds(connect: u64, session_ack: u64, reply: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect),
            session_ack: Duration::from_secs(session_ack),
            reply: Duration::from_secs(reply),
        }
    }
}

/// How attachments are routed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSettings {
    pub policy: MediaPolicy,
    /// Sent as `storageMethod` with every upload.
    pub storage_method: String,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            policy: MediaPolicy::default(),
            storage_method: DEFAULT_STORAGE_METHOD.to_string(),
        }
    }
}
