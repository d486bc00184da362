//! Normalized inbound session activity.
//!
//! The wire protocol nests model output several levels deep; the
//! infrastructure layer flattens each inbound frame into zero or more
//! [`LiveEvent`]s before they reach the [`ResponseAssembler`](super::assembler::ResponseAssembler).

use serde_json::Value;

/// One unit of model activity within a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A piece of reply text, in send order.
    TextFragment(String),
    /// Transcription of spoken output; treated like reply text.
    Transcription(String),
    /// A piece of binary (audio) output, already decoded.
    AudioFragment { mime_type: String, data: Vec<u8> },
    /// A structured tool/function call from the model.
    ToolCall(Value),
    /// The model finished generating this reply.
    GenerationComplete,
    /// The server closed the model turn. Trails `GenerationComplete` when
    /// both are sent.
    TurnComplete,
    /// The reply was cut short by the server.
    Interrupted,
    /// The server reported an error; carries its message.
    Failed(String),
}

impl LiveEvent {
    /// Whether this event ends the current reply.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LiveEvent::GenerationComplete
                | LiveEvent::TurnComplete
                | LiveEvent::Interrupted
                | LiveEvent::Failed(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::TextFragment(_) => "text_fragment",
            LiveEvent::Transcription(_) => "transcription",
            LiveEvent::AudioFragment { .. } => "audio_fragment",
            LiveEvent::ToolCall(_) => "tool_call",
            LiveEvent::GenerationComplete => "generation_complete",
            LiveEvent::TurnComplete => "turn_complete",
            LiveEvent::Interrupted => "interrupted",
            LiveEvent::Failed(_) => "failed",
        }
    }
}
