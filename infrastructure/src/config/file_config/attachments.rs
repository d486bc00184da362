//! Attachment routing from TOML (`[attachments]` section)

use live_application::AttachmentSettings;
use live_application::config::DEFAULT_STORAGE_METHOD;
use live_domain::MediaPolicy;
use live_domain::attachment::media::DEFAULT_INLINE_LIMIT_BYTES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAttachmentsConfig {
    /// Files above this size are uploaded instead of inlined
    pub inline_limit_bytes: u64,
    /// `storageMethod` sent with uploads
    pub storage_method: String,
    /// Where audio replies are written; unset discards them
    pub audio_output_dir: Option<String>,
}

impl Default for FileAttachmentsConfig {
    fn default() -> Self {
        Self {
            inline_limit_bytes: DEFAULT_INLINE_LIMIT_BYTES,
            storage_method: DEFAULT_STORAGE_METHOD.to_string(),
            audio_output_dir: None,
        }
    }
}

impl FileAttachmentsConfig {
    pub fn to_settings(&self) -> AttachmentSettings {
        AttachmentSettings {
            policy: MediaPolicy::default().with_inline_limit(self.inline_limit_bytes),
            storage_method: self.storage_method.clone(),
        }
    }
}
