//! Audio reply persistence.
//!
//! Each reply's audio fragments are appended to one file named
//! `reply_<YYYYMMDD_HHMMSS_mmm>.<ext>` under a fixed output directory,
//! created on first use. Playback is left to external tools.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Receives decoded audio fragments as they stream in.
///
/// Called from the connection's reader task; implementations must not block
/// for long and must not fail the connection.
pub trait AudioSink: Send + Sync {
    fn write_fragment(&self, mime_type: &str, data: &[u8]);

    /// The current reply ended; returns the file it was written to, if any.
    fn finish_reply(&self) -> Option<PathBuf>;
}

/// Discards audio.
pub struct NoAudioSink;

impl AudioSink for NoAudioSink {
    fn write_fragment(&self, _mime_type: &str, _data: &[u8]) {}

    fn finish_reply(&self) -> Option<PathBuf> {
        None
    }
}

/// File extension for an audio mime type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/pcm" | "audio/l16" | "audio/raw" => "pcm",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" | "audio/opus" => "ogg",
        _ => "bin",
    }
}

struct OpenReply {
    path: PathBuf,
    file: File,
}

/// Writes one file per reply under `output_dir`.
pub struct FileAudioSink {
    output_dir: PathBuf,
    current: Mutex<Option<OpenReply>>,
}

impl FileAudioSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            current: Mutex::new(None),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn open(&self, mime_type: &str) -> std::io::Result<OpenReply> {
        fs::create_dir_all(&self.output_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let path = self
            .output_dir
            .join(format!("reply_{}.{}", stamp, extension_for_mime(mime_type)));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Writing audio reply to {}", path.display());
        Ok(OpenReply { path, file })
    }
}

impl AudioSink for FileAudioSink {
    fn write_fragment(&self, mime_type: &str, data: &[u8]) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if current.is_none() {
            match self.open(mime_type) {
                Ok(reply) => *current = Some(reply),
                Err(e) => {
                    warn!("Cannot create audio file in {}: {}", self.output_dir.display(), e);
                    return;
                }
            }
        }
        if let Some(reply) = current.as_mut()
            && let Err(e) = reply.file.write_all(data)
        {
            warn!("Failed to write audio to {}: {}", reply.path.display(), e);
        }
    }

    fn finish_reply(&self) -> Option<PathBuf> {
        let reply = self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()?;
        info!("Saved audio reply to {}", reply.path.display());
        Some(reply.path)
    }
}
