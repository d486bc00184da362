//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Enum-like fields stay strings here and are parsed into domain types by
//! [`FileConfig::validate`] and the `to_*` conversions.

mod attachments;
mod repl;
mod server;
mod session;
mod timeouts;

pub use attachments::FileAttachmentsConfig;
pub use repl::FileReplConfig;
pub use server::FileServerConfig;
pub use session::FileSessionConfig;
pub use timeouts::FileTimeoutsConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("timeouts.{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("session.model cannot be empty")]
    EmptyModel,

    #[error("server.ws_url must start with ws:// or wss://, got '{0}'")]
    InvalidWsUrl(String),

    #[error("server.api_url must start with http:// or https://, got '{0}'")]
    InvalidApiUrl(String),

    #[error("session: {0}")]
    InvalidSession(String),

    #[error("attachments.inline_limit_bytes cannot be 0")]
    ZeroInlineLimit,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: FileServerConfig,
    pub session: FileSessionConfig,
    pub timeouts: FileTimeoutsConfig,
    pub attachments: FileAttachmentsConfig,
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        let ws = self.server.ws_url.to_ascii_lowercase();
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            issues.push(ConfigValidationError::InvalidWsUrl(self.server.ws_url.clone()));
        }
        let api = self.server.api_url.to_ascii_lowercase();
        if !(api.starts_with("http://") || api.starts_with("https://")) {
            issues.push(ConfigValidationError::InvalidApiUrl(self.server.api_url.clone()));
        }

        if self.session.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModel);
        } else if let Err(e) = self.session.to_session_config() {
            issues.push(ConfigValidationError::InvalidSession(e.to_string()));
        }

        for (name, value) in [
            ("connect_seconds", self.timeouts.connect_seconds),
            ("session_ack_seconds", self.timeouts.session_ack_seconds),
            ("reply_seconds", self.timeouts.reply_seconds),
        ] {
            if value == 0 {
                issues.push(ConfigValidationError::ZeroTimeout(name));
            }
        }

        if self.attachments.inline_limit_bytes == 0 {
            issues.push(ConfigValidationError::ZeroInlineLimit);
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_domain::{MediaResolution, ResponseModality};
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[server]
ws_url = "wss://live.example.com/ws"
api_url = "https://live.example.com/api"

[session]
model = "gemini-live-test"
response_modality = "audio"
media_resolution = "high"
voice = "Puck"
load_conversation_context = true

[timeouts]
connect_seconds = 5
session_ack_seconds = 7
reply_seconds = 60

[attachments]
inline_limit_bytes = 1048576
storage_method = "local"
audio_output_dir = "/tmp/replies"

[repl]
show_progress = false
history_file = "~/.local/share/live-chat/history.txt"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());
        assert_eq!(config.server.ws_url, "wss://live.example.com/ws");

        let session = config.session.to_session_config().unwrap();
        assert_eq!(session.model, "gemini-live-test");
        assert_eq!(session.response_modality, ResponseModality::Audio);
        assert_eq!(session.media_resolution, MediaResolution::High);
        assert_eq!(session.voice.unwrap().voice_name, "Puck");
        assert!(config.session.load_conversation_context);

        let timeouts = config.timeouts.to_timeouts();
        assert_eq!(timeouts.connect, Duration::from_secs(5));
        assert_eq!(timeouts.reply, Duration::from_secs(60));

        let attachments = config.attachments.to_settings();
        assert_eq!(attachments.policy.inline_limit_bytes, 1_048_576);
        assert_eq!(attachments.storage_method, "local");
        assert!(!config.repl.show_progress);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[timeouts]
reply_seconds = 90
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timeouts.reply_seconds, 90);
        // Defaults should apply
        assert_eq!(config.timeouts.connect_seconds, 10);
        assert_eq!(config.server.ws_url, server::DEFAULT_WS_URL);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.timeouts.session_ack_seconds, 10);
        assert_eq!(config.attachments.inline_limit_bytes, 20 * 1024 * 1024);
        assert_eq!(config.attachments.storage_method, "google-file-api");
        assert!(config.attachments.audio_output_dir.is_none());

        let session = config.session.to_session_config().unwrap();
        assert_eq!(session.response_modality, ResponseModality::Text);
        assert!(session.voice.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FileConfig::default();
        config.server.ws_url = "http://localhost:5000".to_string();
        config.session.model = "  ".to_string();
        config.timeouts.reply_seconds = 0;

        let issues = config.validate();
        assert_eq!(
            issues,
            vec![
                ConfigValidationError::InvalidWsUrl("http://localhost:5000".to_string()),
                ConfigValidationError::EmptyModel,
                ConfigValidationError::ZeroTimeout("reply_seconds"),
            ]
        );
    }

    #[test]
    fn test_validate_unknown_modality() {
        let mut config = FileConfig::default();
        config.session.response_modality = "video".to_string();
        assert!(matches!(
            config.validate().as_slice(),
            [ConfigValidationError::InvalidSession(_)]
        ));
    }
}
