//! Infrastructure layer for live-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod directory;
pub mod live;
pub mod logging;
pub mod media;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAttachmentsConfig, FileConfig, FileReplConfig,
    FileServerConfig, FileSessionConfig, FileTimeoutsConfig,
};
pub use directory::DirectoryClient;
pub use live::{
    client::LiveClient,
    error::{LiveError, Result},
    gateway::WsLiveGateway,
    mailbox::Mailbox,
};
pub use logging::JsonlConversationLogger;
pub use media::{AudioSink, FileAudioSink, NoAudioSink};
