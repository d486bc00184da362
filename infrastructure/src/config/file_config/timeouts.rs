//! Wait bounds from TOML (`[timeouts]` section)

use live_application::LiveTimeouts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    pub connect_seconds: u64,
    pub session_ack_seconds: u64,
    pub reply_seconds: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_seconds: 10,
            session_ack_seconds: 10,
            reply_seconds: 30,
        }
    }
}

impl FileTimeoutsConfig {
    pub fn to_timeouts(&self) -> LiveTimeouts {
        LiveTimeouts::from_seconds(
            self.connect_seconds,
            self.session_ack_seconds,
            self.reply_seconds,
        )
    }
}
