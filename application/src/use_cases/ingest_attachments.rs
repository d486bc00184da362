//! Ingest Attachments use case.
//!
//! Turns the file references of one turn into [`Part`]s: each file is either
//! read and inlined (base64) or uploaded to the Directory Service and
//! referenced by URI. A batch is never mixed; if any file has to be uploaded,
//! all of them are.
//!
//! Failures are per file. A file that cannot be resolved, read or uploaded is
//! reported and the remaining files are still processed.

use crate::context::LiveContext;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::file_uploader::{FileUploader, UploadError, UploadRequest};
use crate::ports::progress::TurnProgressNotifier;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use live_domain::attachment::media::{accepted_formats_hint, declared_media_type};
use live_domain::{Delivery, FileFacts, FileReference, Part, ResolutionState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why one attachment could not be turned into a part.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Upload of {name} failed: {source}")]
    Upload { name: String, source: UploadError },

    #[error("{name}: file type not accepted by the server. Supported formats: {hint}")]
    UnsupportedType { name: String, hint: &'static str },

    #[error("Upload of {name} returned no file URI")]
    MissingUri { name: String },

    #[error("Uploading {name} requires a signed-in user (use --guest, --email or --user-id)")]
    NoOwner { name: String },
}

/// Outcome of ingesting one batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Parts in reference order, failed files skipped.
    pub parts: Vec<Part>,
    pub failures: Vec<AttachmentError>,
    /// How the batch was delivered; `None` when nothing resolved.
    pub delivery: Option<Delivery>,
}

impl IngestReport {
    pub fn all_failed(&self) -> bool {
        self.parts.is_empty() && !self.failures.is_empty()
    }
}

/// Resolve a reference to an absolute path of an existing regular file.
///
/// Relative paths are joined to `base_dir`; a leading `~/` expands to the
/// home directory.
pub fn resolve_reference(
    reference: FileReference,
    base_dir: &Path,
) -> Result<FileReference, AttachmentError> {
    let candidate = expand_home(reference.path());
    let absolute = if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    };

    if !absolute.is_file() {
        return Err(AttachmentError::NotFound(absolute));
    }
    Ok(reference.resolve_to(absolute))
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

/// Use case for turning file references into turn parts.
pub struct IngestAttachmentsUseCase {
    uploader: Arc<dyn FileUploader>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Clone for IngestAttachmentsUseCase {
    fn clone(&self) -> Self {
        Self {
            uploader: self.uploader.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl IngestAttachmentsUseCase {
    pub fn new(uploader: Arc<dyn FileUploader>) -> Self {
        Self {
            uploader,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Ingest `references` in order.
    pub async fn execute(
        &self,
        references: Vec<FileReference>,
        ctx: &LiveContext,
        progress: &dyn TurnProgressNotifier,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        // Resolve and stat everything first; the batch policy needs all sizes.
        let mut ready: Vec<(FileReference, FileFacts)> = Vec::new();
        for reference in references {
            if reference.state() == ResolutionState::Cancelled {
                continue;
            }
            let resolved = match resolve_reference(reference.clone(), ctx.working_dir()) {
                Ok(r) => r,
                Err(e) => {
                    self.record_failure(&mut report, &reference, e, progress);
                    continue;
                }
            };
            match std::fs::metadata(resolved.path()) {
                Ok(meta) => {
                    let facts = FileFacts::new(resolved.extension(), meta.len());
                    ready.push((resolved, facts));
                }
                Err(e) => {
                    let err = AttachmentError::Read {
                        path: resolved.path().to_path_buf(),
                        reason: e.to_string(),
                    };
                    self.record_failure(&mut report, &resolved, err, progress);
                }
            }
        }

        if ready.is_empty() {
            return report;
        }

        let policy = &ctx.attachments().policy;
        let delivery = policy.delivery_for_batch(ready.iter().map(|(_, facts)| facts));
        report.delivery = Some(delivery);

        info!(
            "Ingesting {} attachment(s) via {:?}",
            ready.len(),
            delivery
        );
        progress.on_ingest_start(ready.len(), delivery == Delivery::Upload);

        // Sequential on purpose: one request per file, in reference order.
        for (reference, facts) in ready {
            let result = match delivery {
                Delivery::Inline => inline_part(&reference, &facts),
                Delivery::Upload => self.upload_part(&reference, &facts, ctx).await,
            };
            match result {
                Ok(part) => {
                    debug!("Attached {} as {}", reference.display_name(), part.kind());
                    progress.on_file_done(&reference, true);
                    report.parts.push(part);
                }
                Err(e) => self.record_failure(&mut report, &reference, e, progress),
            }
        }

        report
    }

    async fn upload_part(
        &self,
        reference: &FileReference,
        facts: &FileFacts,
        ctx: &LiveContext,
    ) -> Result<Part, AttachmentError> {
        let name = reference.display_name();
        let Some(owner) = ctx.user() else {
            return Err(AttachmentError::NoOwner { name });
        };

        let mime_type = declared_media_type(facts.extension.as_deref());
        let request = UploadRequest {
            path: reference.path().to_path_buf(),
            display_name: name.clone(),
            mime_type: mime_type.to_string(),
            owner: owner.clone(),
            conversation_id: ctx.conversation_id().map(str::to_string),
            storage_method: ctx.attachments().storage_method.clone(),
        };

        debug!("Uploading {} ({} bytes, {})", name, facts.size_bytes, mime_type);
        let uploaded = self.uploader.upload(&request).await.map_err(|source| {
            if source.is_unsupported_type() {
                AttachmentError::UnsupportedType {
                    name: name.clone(),
                    hint: accepted_formats_hint(),
                }
            } else {
                AttachmentError::Upload {
                    name: name.clone(),
                    source,
                }
            }
        })?;

        let Some(uri) = uploaded.uri else {
            return Err(AttachmentError::MissingUri { name });
        };
        Ok(Part::file(mime_type, uri))
    }

    fn record_failure(
        &self,
        report: &mut IngestReport,
        reference: &FileReference,
        error: AttachmentError,
        progress: &dyn TurnProgressNotifier,
    ) {
        warn!("Attachment {} skipped: {}", reference.raw(), error);
        progress.on_file_done(reference, false);
        self.conversation_logger.log(ConversationEvent::new(
            "attachment_failed",
            serde_json::json!({
                "reference": reference.raw(),
                "error": error.to_string(),
            }),
        ));
        report.failures.push(error);
    }
}

fn inline_part(reference: &FileReference, facts: &FileFacts) -> Result<Part, AttachmentError> {
    let bytes = std::fs::read(reference.path()).map_err(|e| AttachmentError::Read {
        path: reference.path().to_path_buf(),
        reason: e.to_string(),
    })?;
    let mime_type = declared_media_type(facts.extension.as_deref());
    Ok(Part::inline(mime_type, STANDARD.encode(bytes)))
}
