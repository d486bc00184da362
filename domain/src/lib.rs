//! Domain layer for live-chat
//!
//! Pure types and rules for talking to a Live-Session server, with no I/O.
//!
//! # Core Concepts
//!
//! - **Session**: one negotiated model session per WebSocket connection,
//!   configured once by [`SessionConfig`] and tracked by [`SessionState`]
//! - **Turn**: a complete user message made of ordered [`Part`]s
//! - **Attachment**: `@path` references extracted from input and routed
//!   inline or via upload by [`MediaPolicy`]
//! - **Reply**: streamed fragments reassembled by [`ResponseAssembler`]

pub mod attachment;
pub mod core;
pub mod reply;
pub mod session;

// Re-export commonly used types
pub use attachment::{
    Delivery, FileFacts, FileReference, MediaPolicy, ParsedInput, ResolutionState,
    parse_attachments,
};
pub use core::error::DomainError;
pub use reply::{AssembledReply, LiveEvent, ReplyOutcome, ResponseAssembler};
pub use session::{
    entities::{
        MediaResolution, ResponseModality, SessionConfig, SessionHandle, SessionState, VoiceConfig,
    },
    turn::{Part, Role, Turn},
};
