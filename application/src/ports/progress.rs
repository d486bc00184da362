//! Progress notification port
//!
//! Defines the callbacks a turn reports while attachments are ingested and
//! the reply is awaited.

use live_domain::FileReference;

/// Callback for progress updates during one turn.
///
/// Implementations live in the presentation layer (spinner, plain log lines).
pub trait TurnProgressNotifier: Send + Sync {
    /// Called before attachments are read or uploaded.
    fn on_ingest_start(&self, _files: usize, _uploading: bool) {}

    /// Called after each attachment, successful or not.
    fn on_file_done(&self, _reference: &FileReference, _success: bool) {}

    /// Called once the turn is on the wire.
    fn on_turn_sent(&self, _parts: usize) {}

    /// Called for every tool call observed while waiting.
    fn on_tool_call(&self, _call: &serde_json::Value) {}

    /// Called when waiting ends, with or without a reply.
    fn on_reply_done(&self) {}
}

/// No-op progress notifier
pub struct NoProgress;

impl TurnProgressNotifier for NoProgress {}
