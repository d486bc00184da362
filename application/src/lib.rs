//! Application layer for live-chat
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod context;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AttachmentSettings, LiveTimeouts};
pub use context::LiveContext;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    directory::{ConversationSummary, DirectoryError, DirectoryPort, UserIdentity},
    file_uploader::{FileUploader, UploadError, UploadRequest, UploadedFile},
    live_gateway::{GatewayError, LiveGateway, LiveSession},
    progress::{NoProgress, TurnProgressNotifier},
};
pub use use_cases::ingest_attachments::{
    AttachmentError, IngestAttachmentsUseCase, IngestReport, resolve_reference,
};
pub use use_cases::run_turn::{RunTurnError, RunTurnUseCase, TurnInput, TurnOutput};
