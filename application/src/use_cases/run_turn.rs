//! Run Turn use case.
//!
//! One user turn: parse attachments, ingest files, compose parts, send, and
//! wait for the assembled reply.
//!
//! Parts are ordered attachments first (in reference order) and the text
//! last. Tool calls arriving while the reply is awaited are collected and
//! returned alongside it.

use crate::context::LiveContext;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::live_gateway::{GatewayError, LiveSession};
use crate::ports::progress::TurnProgressNotifier;
use crate::use_cases::ingest_attachments::{AttachmentError, IngestAttachmentsUseCase};
use live_domain::{DomainError, FileReference, Part, ReplyOutcome, Turn, parse_attachments};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors that can occur while running a turn.
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error("Nothing to send")]
    NothingToSend { failures: Vec<AttachmentError> },

    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("No complete reply within {}s", .0.as_secs())]
    ReplyTimeout(Duration),

    #[error("Session error: {message}")]
    SessionFailed {
        message: String,
        /// Reply text received before the error.
        partial: Option<String>,
    },

    #[error("Invalid turn: {0}")]
    Domain(#[from] DomainError),
}

/// What the user submitted.
#[derive(Debug, Clone)]
pub enum TurnInput {
    /// A raw line, possibly containing `@path` tokens.
    Text(String),
    /// Files chosen through the interactive picker plus the message text.
    Selected { paths: Vec<PathBuf>, message: String },
}

impl TurnInput {
    fn into_text_and_references(self) -> (String, Vec<FileReference>) {
        match self {
            TurnInput::Text(line) => {
                let parsed = parse_attachments(&line);
                (parsed.cleaned_text, parsed.references)
            }
            TurnInput::Selected { paths, message } => {
                let references = paths
                    .into_iter()
                    .map(|p| FileReference::unresolved(format!("@{}", p.display()), p))
                    .collect();
                (message.trim().to_string(), references)
            }
        }
    }
}

/// Result of one completed turn.
#[derive(Debug)]
pub struct TurnOutput {
    /// Terminal outcome: [`ReplyOutcome::Reply`] or [`ReplyOutcome::Empty`].
    /// A [`ReplyOutcome::Failed`] surfaces as [`RunTurnError::SessionFailed`] instead.
    pub outcome: ReplyOutcome,
    pub tool_calls: Vec<Value>,
    pub attachments_sent: usize,
    pub attachment_failures: Vec<AttachmentError>,
}

impl TurnOutput {
    pub fn reply_text(&self) -> Option<&str> {
        match &self.outcome {
            ReplyOutcome::Reply(reply) => Some(&reply.text),
            _ => None,
        }
    }
}

/// Use case for running one user turn over an active session.
pub struct RunTurnUseCase {
    ingest: IngestAttachmentsUseCase,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RunTurnUseCase {
    pub fn new(ingest: IngestAttachmentsUseCase) -> Self {
        Self {
            ingest,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.ingest = self.ingest.with_conversation_logger(logger.clone());
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(
        &self,
        session: &dyn LiveSession,
        ctx: &LiveContext,
        input: TurnInput,
        progress: &dyn TurnProgressNotifier,
    ) -> Result<TurnOutput, RunTurnError> {
        let (text, references) = input.into_text_and_references();
        if text.is_empty() && references.is_empty() {
            return Err(RunTurnError::NothingToSend {
                failures: Vec::new(),
            });
        }

        let report = self.ingest.execute(references, ctx, progress).await;
        if report.all_failed() {
            warn!(
                "All {} attachment(s) failed; sending text only",
                report.failures.len()
            );
        }

        let attachments_sent = report.parts.len();
        let mut parts = report.parts;
        if !text.is_empty() {
            parts.push(Part::text(&text));
        }
        if parts.is_empty() {
            return Err(RunTurnError::NothingToSend {
                failures: report.failures,
            });
        }
        let turn = Turn::user(parts)?;

        for stale in session.drain_outcomes().await {
            debug!("Discarding stale outcome from an earlier turn: {:?}", stale);
        }

        session.send_turn(&turn).await?;
        progress.on_turn_sent(turn.parts().len());
        self.conversation_logger.log(ConversationEvent::new(
            "turn_sent",
            serde_json::json!({
                "session_id": session.handle().map(|h| h.session_id),
                "parts": turn.parts().iter().map(|p| p.kind()).collect::<Vec<_>>(),
                "text": text,
            }),
        ));

        let waited = self.await_reply(session, ctx.timeouts().reply, progress).await;
        progress.on_reply_done();
        if let Err(RunTurnError::SessionFailed { message, partial }) = &waited {
            warn!("Reply failed: {}", message);
            self.conversation_logger.log(ConversationEvent::new(
                "reply_failed",
                serde_json::json!({
                    "error": message,
                    "partial_text": partial,
                }),
            ));
        }
        let (outcome, tool_calls) = waited?;

        if let ReplyOutcome::Reply(reply) = &outcome {
            info!(
                "Reply received ({} bytes{})",
                reply.text.len(),
                if reply.interrupted { ", interrupted" } else { "" }
            );
        }
        self.conversation_logger.log(ConversationEvent::new(
            "reply_received",
            outcome_payload(&outcome, tool_calls.len()),
        ));

        Ok(TurnOutput {
            outcome,
            tool_calls,
            attachments_sent,
            attachment_failures: report.failures,
        })
    }

    /// Wait for a terminal outcome within `limit`, collecting tool calls.
    async fn await_reply(
        &self,
        session: &dyn LiveSession,
        limit: Duration,
        progress: &dyn TurnProgressNotifier,
    ) -> Result<(ReplyOutcome, Vec<Value>), RunTurnError> {
        let deadline = Instant::now() + limit;
        let mut tool_calls = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RunTurnError::ReplyTimeout(limit));
            }

            match session.next_outcome(remaining).await {
                Ok(ReplyOutcome::ToolCall(call)) => {
                    debug!("Tool call during reply: {}", call);
                    progress.on_tool_call(&call);
                    tool_calls.push(call);
                }
                Ok(ReplyOutcome::Failed { message, partial }) => {
                    return Err(RunTurnError::SessionFailed { message, partial });
                }
                Ok(outcome) => return Ok((outcome, tool_calls)),
                Err(GatewayError::Timeout { .. }) => {
                    return Err(RunTurnError::ReplyTimeout(limit));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn outcome_payload(outcome: &ReplyOutcome, tool_calls: usize) -> Value {
    match outcome {
        ReplyOutcome::Reply(reply) => serde_json::json!({
            "text": reply.text,
            "bytes": reply.text.len(),
            "interrupted": reply.interrupted,
            "audio_fragments": reply.audio_fragments,
            "tool_calls": tool_calls,
        }),
        ReplyOutcome::Empty {
            interrupted,
            audio_fragments,
        } => serde_json::json!({
            "empty": true,
            "interrupted": interrupted,
            "audio_fragments": audio_fragments,
            "tool_calls": tool_calls,
        }),
        ReplyOutcome::ToolCall(call) => serde_json::json!({ "tool_call": call }),
        ReplyOutcome::Failed { message, partial } => serde_json::json!({
            "error": message,
            "partial_text": partial,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::file_uploader::{FileUploader, UploadError, UploadRequest, UploadedFile};
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use live_domain::{AssembledReply, SessionConfig, SessionHandle, SessionState};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // ==================== Test Mocks ====================

    struct NoUploads;

    #[async_trait]
    impl FileUploader for NoUploads {
        async fn upload(&self, _request: &UploadRequest) -> Result<UploadedFile, UploadError> {
            Err(UploadError::Network("offline".into()))
        }
    }

    #[derive(Default)]
    struct MockSession {
        sent: Mutex<Vec<Turn>>,
        /// Outcomes already queued before the next send.
        stale: Mutex<Vec<ReplyOutcome>>,
        /// Outcomes produced after a send.
        replies: Mutex<VecDeque<ReplyOutcome>>,
        fail_send: bool,
    }

    #[async_trait]
    impl LiveSession for MockSession {
        fn handle(&self) -> Option<SessionHandle> {
            Some(SessionHandle {
                session_id: "s-1".into(),
                upstream_session_id: None,
            })
        }

        fn state(&self) -> SessionState {
            SessionState::Active
        }

        async fn send_turn(&self, turn: &Turn) -> Result<(), GatewayError> {
            if self.fail_send {
                return Err(GatewayError::TransportClosed);
            }
            self.sent.lock().unwrap().push(turn.clone());
            Ok(())
        }

        async fn next_outcome(&self, timeout: Duration) -> Result<ReplyOutcome, GatewayError> {
            match self.replies.lock().unwrap().pop_front() {
                Some(outcome) => Ok(outcome),
                None => Err(GatewayError::Timeout {
                    what: "reply",
                    after: timeout,
                }),
            }
        }

        async fn drain_outcomes(&self) -> Vec<ReplyOutcome> {
            std::mem::take(&mut *self.stale.lock().unwrap())
        }

        async fn disconnect(&self) {}
    }

    fn reply(text: &str) -> ReplyOutcome {
        ReplyOutcome::Reply(AssembledReply {
            text: text.into(),
            interrupted: false,
            audio_fragments: 0,
        })
    }

    fn use_case() -> RunTurnUseCase {
        RunTurnUseCase::new(IngestAttachmentsUseCase::new(Arc::new(NoUploads)))
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn text_turn_returns_reply() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        session.replies.lock().unwrap().push_back(reply("Hello"));

        let output = use_case()
            .execute(&session, &ctx, TurnInput::Text("  hi there ".into()), &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.reply_text(), Some("Hello"));
        let sent = session.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].parts(), &[Part::text("hi there")]);
    }

    #[tokio::test]
    async fn attachments_precede_text() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"A").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"B").unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        session.replies.lock().unwrap().push_back(reply("ok"));

        let output = use_case()
            .execute(
                &session,
                &ctx,
                TurnInput::Text("Compare @a.txt and @b.txt".into()),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(output.attachments_sent, 2);
        let sent = session.sent.lock().unwrap();
        assert_eq!(
            sent[0].parts(),
            &[
                Part::inline("text/plain", "QQ=="),
                Part::inline("text/plain", "Qg=="),
                Part::text("Compare and"),
            ]
        );
    }

    #[tokio::test]
    async fn all_attachments_failing_falls_back_to_text() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        session.replies.lock().unwrap().push_back(reply("ok"));

        let output = use_case()
            .execute(
                &session,
                &ctx,
                TurnInput::Text("look @missing.png please".into()),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(output.attachments_sent, 0);
        assert_eq!(output.attachment_failures.len(), 1);
        assert_eq!(
            session.sent.lock().unwrap()[0].parts(),
            &[Part::text("look please")]
        );
    }

    #[tokio::test]
    async fn empty_input_is_not_sent() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();

        for input in ["   ", "@", "@[cancelled]", "@missing.txt"] {
            let result = use_case()
                .execute(&session, &ctx, TurnInput::Text(input.into()), &NoProgress)
                .await;
            assert!(
                matches!(result, Err(RunTurnError::NothingToSend { .. })),
                "input: {input:?}"
            );
        }
        assert!(session.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tool_calls_are_collected_until_terminal_outcome() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        {
            let mut replies = session.replies.lock().unwrap();
            replies.push_back(ReplyOutcome::ToolCall(serde_json::json!({"name": "a"})));
            replies.push_back(ReplyOutcome::ToolCall(serde_json::json!({"name": "b"})));
            replies.push_back(ReplyOutcome::Empty {
                interrupted: false,
                audio_fragments: 0,
            });
        }

        let output = use_case()
            .execute(&session, &ctx, TurnInput::Text("go".into()), &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.tool_calls.len(), 2);
        assert_eq!(output.reply_text(), None);
        assert!(matches!(output.outcome, ReplyOutcome::Empty { .. }));
    }

    #[tokio::test]
    async fn server_failure_ends_wait_with_partial_text() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        session
            .replies
            .lock()
            .unwrap()
            .push_back(ReplyOutcome::Failed {
                message: "quota exceeded".into(),
                partial: Some("par".into()),
            });

        let result = use_case()
            .execute(&session, &ctx, TurnInput::Text("go".into()), &NoProgress)
            .await;

        match result {
            Err(RunTurnError::SessionFailed { message, partial }) => {
                assert_eq!(message, "quota exceeded");
                assert_eq!(partial.as_deref(), Some("par"));
            }
            other => panic!("expected SessionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_outcomes_are_drained_before_send() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        session.stale.lock().unwrap().push(reply("late answer to previous turn"));
        session.replies.lock().unwrap().push_back(reply("fresh"));

        let output = use_case()
            .execute(&session, &ctx, TurnInput::Text("next".into()), &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.reply_text(), Some("fresh"));
        assert!(session.stale.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_reply_times_out() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();

        let result = use_case()
            .execute(&session, &ctx, TurnInput::Text("hello?".into()), &NoProgress)
            .await;

        assert!(matches!(
            result,
            Err(RunTurnError::ReplyTimeout(d)) if d == Duration::from_secs(30)
        ));
    }

    #[tokio::test]
    async fn send_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession {
            fail_send: true,
            ..Default::default()
        };

        let result = use_case()
            .execute(&session, &ctx, TurnInput::Text("hi".into()), &NoProgress)
            .await;

        assert!(matches!(
            result,
            Err(RunTurnError::GatewayError(GatewayError::TransportClosed))
        ));
    }

    #[tokio::test]
    async fn selected_files_resolve_against_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pic.png"), [1u8, 2, 3]).unwrap();
        let ctx = LiveContext::new(SessionConfig::default(), dir.path());
        let session = MockSession::default();
        session.replies.lock().unwrap().push_back(reply("nice"));

        let output = use_case()
            .execute(
                &session,
                &ctx,
                TurnInput::Selected {
                    paths: vec![PathBuf::from("pic.png")],
                    message: " describe ".into(),
                },
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(output.attachments_sent, 1);
        let sent = session.sent.lock().unwrap();
        assert_eq!(sent[0].parts().len(), 2);
        assert_eq!(sent[0].parts()[1], Part::text("describe"));
    }
}
