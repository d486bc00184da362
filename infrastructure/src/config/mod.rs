//! Configuration file loading for live-chat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./live-chat.toml` or `./.live-chat.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/live-chat/config.toml`
//! 4. Fallback: `~/.config/live-chat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAttachmentsConfig, FileConfig, FileReplConfig, FileServerConfig,
    FileSessionConfig, FileTimeoutsConfig,
};
pub use loader::ConfigLoader;
