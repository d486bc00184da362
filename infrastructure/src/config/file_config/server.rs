//! Endpoint configuration from TOML (`[server]` section)

use serde::{Deserialize, Serialize};

pub const DEFAULT_WS_URL: &str = "ws://localhost:5000/live";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Live-Session WebSocket endpoint
    pub ws_url: String,
    /// Directory Service base URL
    pub api_url: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}
