//! Wire types for the Live-Session WebSocket protocol.
//!
//! # Protocol Overview
//!
//! - **Outbound**: one JSON object per text frame, wrapped as
//!   `{"type": <kind>, "data": <payload>}` (`create_session`, `send_message`)
//! - **Inbound**: one JSON object per text frame with a `type` discriminator
//!   and the payload fields beside it (`session_created`, `session_message`,
//!   `generation_complete`, ...)
//!
//! [`live_events`] flattens an inbound message into the domain's
//! [`LiveEvent`]s.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use live_domain::{
    LiveEvent, MediaResolution, Part, ResponseModality, SessionConfig, Turn,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Outbound frame envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: T,
}

// ==================== create_session ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    pub model: String,
    pub config: LiveSessionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_conversation_context: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionConfig {
    pub response_modalities: Vec<ResponseModality>,
    pub realtime_input_config: RealtimeInputConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
    /// Empty object; present only for audio replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputConfig {
    pub media_resolution: MediaResolution,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: WireVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

impl From<&SessionConfig> for CreateSessionPayload {
    fn from(config: &SessionConfig) -> Self {
        let audio = config.response_modality == ResponseModality::Audio;
        Self {
            model: config.model.clone(),
            config: LiveSessionConfig {
                response_modalities: vec![config.response_modality],
                realtime_input_config: RealtimeInputConfig {
                    media_resolution: config.media_resolution,
                },
                speech_config: config.voice.as_ref().map(|v| SpeechConfig {
                    voice_config: WireVoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: v.voice_name.clone(),
                        },
                    },
                }),
                output_audio_transcription: audio.then(serde_json::Map::new),
            },
            conversation_id: config.conversation_id.clone(),
            user_id: config.user_id.clone(),
            load_conversation_context: config.load_conversation_context.then_some(true),
        }
    }
}

// ==================== send_message ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub session_id: String,
    pub data: ClientContent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<WireTurn>,
    pub turn_complete: bool,
}

#[derive(Debug, Serialize)]
pub struct WireTurn {
    pub role: &'static str,
    pub parts: Vec<WirePart>,
}

/// One part; serializes as `{"text": ..}`, `{"inlineData": {..}}` or `{"fileData": {..}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WirePart {
    Text(String),
    InlineData(Blob),
    FileData(FileData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text(text.clone()),
            Part::InlineData { mime_type, data } => WirePart::InlineData(Blob {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
            Part::FileData {
                mime_type,
                file_uri,
            } => WirePart::FileData(FileData {
                mime_type: mime_type.clone(),
                file_uri: file_uri.clone(),
            }),
        }
    }
}

impl SendMessagePayload {
    pub fn new(session_id: impl Into<String>, turn: &Turn) -> Self {
        Self {
            session_id: session_id.into(),
            data: ClientContent {
                turns: vec![WireTurn {
                    role: turn.role().as_str(),
                    parts: turn.parts().iter().map(WirePart::from).collect(),
                }],
                turn_complete: turn.is_complete(),
            },
        }
    }
}

/// Serialize a `create_session` frame.
pub fn create_session_frame(config: &SessionConfig) -> serde_json::Result<String> {
    serde_json::to_string(&Envelope {
        kind: "create_session",
        data: CreateSessionPayload::from(config),
    })
}

/// Serialize a `send_message` frame.
pub fn send_message_frame(session_id: &str, turn: &Turn) -> serde_json::Result<String> {
    serde_json::to_string(&Envelope {
        kind: "send_message",
        data: SendMessagePayload::new(session_id, turn),
    })
}

// ==================== Inbound ====================

/// Inbound message, discriminated by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Connection {
        #[serde(default)]
        message: Option<String>,
    },
    SessionCreated {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "geminiSessionId", default)]
        upstream_session_id: Option<String>,
    },
    ContextLoaded {
        #[serde(rename = "messagesLoaded", default)]
        messages_loaded: Option<u64>,
    },
    SessionMessage {
        data: SessionMessageData,
    },
    GenerationComplete {},
    SessionResumptionUpdate {},
    Ping {},
    SessionError {
        #[serde(default)]
        error: Option<Value>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<Value>,
    },
    AudioSaved {
        #[serde(rename = "audioId", default)]
        audio_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessageData {
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub tool_call: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<ModelTurn>,
    #[serde(default)]
    pub output_transcription: Option<Transcription>,
    #[serde(default)]
    pub interrupted: Option<bool>,
    #[serde(default)]
    pub generation_complete: Option<bool>,
    #[serde(default)]
    pub turn_complete: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelTurn {
    #[serde(default)]
    pub parts: Vec<InboundPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundPart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<Blob>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: Option<String>,
}

impl InboundMessage {
    /// Human-readable error carried by `session_error` / `error`.
    pub fn error_text(&self) -> Option<String> {
        match self {
            InboundMessage::SessionError { error } => {
                Some(error.as_ref().map(value_text).unwrap_or_else(|| "session error".into()))
            }
            InboundMessage::Error { message, error } => Some(
                message
                    .clone()
                    .or_else(|| error.as_ref().map(value_text))
                    .unwrap_or_else(|| "server error".into()),
            ),
            _ => None,
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Flatten one inbound message into assembler events, in delivery order.
///
/// Content fragments come first and termination signals last, so a frame
/// carrying both text and `generationComplete` flushes that text. Server
/// errors become [`LiveEvent::Failed`] so a pending reply ends at once.
pub fn live_events(message: &InboundMessage) -> Vec<LiveEvent> {
    let mut events = Vec::new();
    match message {
        InboundMessage::SessionMessage { data } => {
            if let Some(content) = &data.server_content {
                if let Some(turn) = &content.model_turn {
                    for part in &turn.parts {
                        if let Some(text) = &part.text {
                            events.push(LiveEvent::TextFragment(text.clone()));
                        }
                        if let Some(blob) = &part.inline_data {
                            match STANDARD.decode(&blob.data) {
                                Ok(bytes) => events.push(LiveEvent::AudioFragment {
                                    mime_type: blob.mime_type.clone(),
                                    data: bytes,
                                }),
                                Err(e) => warn!("Dropping undecodable {} fragment: {}", blob.mime_type, e),
                            }
                        }
                    }
                }
                if let Some(text) = content.output_transcription.as_ref().and_then(|t| t.text.as_ref()) {
                    events.push(LiveEvent::Transcription(text.clone()));
                }
            }
            if let Some(call) = &data.tool_call {
                events.push(LiveEvent::ToolCall(call.clone()));
            }
            if let Some(content) = &data.server_content {
                if content.interrupted == Some(true) {
                    events.push(LiveEvent::Interrupted);
                } else {
                    if content.generation_complete == Some(true) {
                        events.push(LiveEvent::GenerationComplete);
                    }
                    if content.turn_complete == Some(true) {
                        events.push(LiveEvent::TurnComplete);
                    }
                }
            }
        }
        InboundMessage::GenerationComplete {} => events.push(LiveEvent::GenerationComplete),
        InboundMessage::SessionError { .. } | InboundMessage::Error { .. } => {
            if let Some(text) = message.error_text() {
                events.push(LiveEvent::Failed(text));
            }
        }
        _ => {}
    }
    events
}
