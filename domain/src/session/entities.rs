//! Live session entities and value objects.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default Live model used when none is configured.
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.0-flash-live-001";

/// How the model answers: text today, audio reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    #[default]
    #[serde(alias = "text")]
    Text,
    #[serde(alias = "audio")]
    Audio,
}

impl ResponseModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseModality::Text => "TEXT",
            ResponseModality::Audio => "AUDIO",
        }
    }
}

impl fmt::Display for ResponseModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseModality {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(ResponseModality::Text),
            "AUDIO" => Ok(ResponseModality::Audio),
            _ => Err(DomainError::InvalidModality(s.to_string())),
        }
    }
}

/// Media-resolution tier requested for realtime input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaResolution {
    #[serde(rename = "MEDIA_RESOLUTION_LOW", alias = "low")]
    Low,
    #[default]
    #[serde(rename = "MEDIA_RESOLUTION_MEDIUM", alias = "medium")]
    Medium,
    #[serde(rename = "MEDIA_RESOLUTION_HIGH", alias = "high")]
    High,
}

impl MediaResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaResolution::Low => "MEDIA_RESOLUTION_LOW",
            MediaResolution::Medium => "MEDIA_RESOLUTION_MEDIUM",
            MediaResolution::High => "MEDIA_RESOLUTION_HIGH",
        }
    }
}

impl fmt::Display for MediaResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaResolution {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.trim_start_matches("MEDIA_RESOLUTION_") {
            "LOW" => Ok(MediaResolution::Low),
            "MEDIUM" => Ok(MediaResolution::Medium),
            "HIGH" => Ok(MediaResolution::High),
            _ => Err(DomainError::InvalidMediaResolution(s.to_string())),
        }
    }
}

/// Prebuilt voice selection for audio replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub voice_name: String,
}

impl VoiceConfig {
    pub fn new(voice_name: impl Into<String>) -> Self {
        Self {
            voice_name: voice_name.into(),
        }
    }
}

/// Everything the client asks for when negotiating a session.
///
/// Immutable once the session is created; switching models or clearing
/// session state requires a fresh connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub model: String,
    pub response_modality: ResponseModality,
    pub media_resolution: MediaResolution,
    pub voice: Option<VoiceConfig>,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub load_conversation_context: bool,
}

impl SessionConfig {
    /// Creates a config for the given model with all other fields defaulted.
    pub fn new(model: impl Into<String>) -> Result<Self, DomainError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(DomainError::EmptyModel);
        }
        Ok(Self {
            model,
            response_modality: ResponseModality::default(),
            media_resolution: MediaResolution::default(),
            voice: None,
            conversation_id: None,
            user_id: None,
            load_conversation_context: false,
        })
    }

    pub fn with_modality(mut self, modality: ResponseModality) -> Self {
        self.response_modality = modality;
        self
    }

    pub fn with_media_resolution(mut self, resolution: MediaResolution) -> Self {
        self.media_resolution = resolution;
        self
    }

    pub fn with_voice(mut self, voice: Option<VoiceConfig>) -> Self {
        self.voice = voice;
        self
    }

    /// Links the session to a Directory Service conversation.
    pub fn with_conversation(
        mut self,
        conversation_id: Option<String>,
        load_context: bool,
    ) -> Self {
        self.load_conversation_context = load_context && conversation_id.is_some();
        self.conversation_id = conversation_id;
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_LIVE_MODEL.to_string(),
            response_modality: ResponseModality::default(),
            media_resolution: MediaResolution::default(),
            voice: None,
            conversation_id: None,
            user_id: None,
            load_conversation_context: false,
        }
    }
}

/// Lifecycle of the one session carried by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    AwaitingSessionAck,
    Active,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::AwaitingSessionAck => "awaiting_session_ack",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        }
    }

    /// Whether turns may be sent in this state.
    pub fn can_send(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// Whether a new connect attempt may start from this state.
    pub fn can_connect(&self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-issued identifiers for a negotiated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub session_id: String,
    /// Upstream model-session id, when the server reports one.
    pub upstream_session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modality_parses_case_insensitively() {
        assert_eq!("text".parse::<ResponseModality>(), Ok(ResponseModality::Text));
        assert_eq!("AUDIO".parse::<ResponseModality>(), Ok(ResponseModality::Audio));
        assert!("video".parse::<ResponseModality>().is_err());
    }

    #[test]
    fn media_resolution_accepts_short_and_wire_names() {
        assert_eq!("low".parse::<MediaResolution>(), Ok(MediaResolution::Low));
        assert_eq!(
            "MEDIA_RESOLUTION_HIGH".parse::<MediaResolution>(),
            Ok(MediaResolution::High)
        );
        assert!("ultra".parse::<MediaResolution>().is_err());
    }

    #[test]
    fn media_resolution_serializes_to_wire_name() {
        let json = serde_json::to_value(MediaResolution::Medium).unwrap();
        assert_eq!(json, "MEDIA_RESOLUTION_MEDIUM");
    }

    #[test]
    fn session_config_rejects_blank_model() {
        assert_eq!(SessionConfig::new("  "), Err(DomainError::EmptyModel));
    }

    #[test]
    fn context_loading_requires_a_conversation() {
        let config = SessionConfig::default().with_conversation(None, true);
        assert!(!config.load_conversation_context);

        let config = SessionConfig::default().with_conversation(Some("c-1".into()), true);
        assert!(config.load_conversation_context);
        assert_eq!(config.conversation_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn only_active_sessions_accept_turns() {
        assert!(SessionState::Active.can_send());
        assert!(!SessionState::AwaitingSessionAck.can_send());
        assert!(SessionState::Closed.can_connect());
        assert!(!SessionState::Active.can_connect());
    }
}
