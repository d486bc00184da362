//! File upload port
//!
//! Uploads one local file to the Directory Service and returns the handle the
//! model can reference.

use super::directory::UserIdentity;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from a single upload request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The service answered with an HTTP error status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// No response was received at all.
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx response reporting `success: false`.
    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read file: {0}")]
    Io(String),
}

impl UploadError {
    /// Whether the service refused the file because of its type.
    pub fn is_unsupported_type(&self) -> bool {
        let message = match self {
            UploadError::Http { status: 415, .. } => return true,
            UploadError::Http { message, .. } | UploadError::Rejected(message) => message,
            _ => return false,
        };
        let lower = message.to_ascii_lowercase();
        lower.contains("unsupported") || lower.contains("not supported") || lower.contains("not allowed")
    }
}

/// One file to upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub display_name: String,
    /// Declared media type (markdown already mapped to `text/plain`).
    pub mime_type: String,
    pub owner: UserIdentity,
    pub conversation_id: Option<String>,
    /// Storage backend name sent as `storageMethod`.
    pub storage_method: String,
}

/// What the service returned for one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    /// Model-referenceable URI; missing when the backend stored it elsewhere.
    pub uri: Option<String>,
}

/// Port for uploading attachments
#[async_trait]
pub trait FileUploader: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedFile, UploadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_detection() {
        assert!(
            UploadError::Http {
                status: 415,
                message: "whatever".into()
            }
            .is_unsupported_type()
        );
        assert!(
            UploadError::Http {
                status: 400,
                message: "File type not allowed".into()
            }
            .is_unsupported_type()
        );
        assert!(UploadError::Rejected("Unsupported MIME type".into()).is_unsupported_type());
        assert!(!UploadError::Network("refused".into()).is_unsupported_type());
        assert!(
            !UploadError::Http {
                status: 500,
                message: "HTTP 500 error".into()
            }
            .is_unsupported_type()
        );
    }
}
