//! Session negotiation settings from TOML (`[session]` section)

use live_domain::session::entities::DEFAULT_LIVE_MODEL;
use live_domain::{DomainError, MediaResolution, ResponseModality, SessionConfig, VoiceConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    pub model: String,
    /// `text` or `audio`
    pub response_modality: String,
    /// `low`, `medium` or `high`
    pub media_resolution: String,
    /// Prebuilt voice name for audio replies
    pub voice: Option<String>,
    /// Ask the server to replay the linked conversation's history
    pub load_conversation_context: bool,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_LIVE_MODEL.to_string(),
            response_modality: "text".to_string(),
            media_resolution: "medium".to_string(),
            voice: None,
            load_conversation_context: false,
        }
    }
}

impl FileSessionConfig {
    /// Build the domain session config; conversation and user are linked later.
    pub fn to_session_config(&self) -> Result<SessionConfig, DomainError> {
        let modality: ResponseModality = self.response_modality.parse()?;
        let resolution: MediaResolution = self.media_resolution.parse()?;
        let voice = self
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(VoiceConfig::new);

        Ok(SessionConfig::new(self.model.clone())?
            .with_modality(modality)
            .with_media_resolution(resolution)
            .with_voice(voice))
    }
}
