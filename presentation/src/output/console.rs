//! Console output formatter for turns and session status

use colored::Colorize;
use live_application::{
    AttachmentError, ConversationSummary, LiveContext, RunTurnError, TurnOutput,
};
use live_domain::{ReplyOutcome, SessionHandle, SessionState};

/// Formats turn results and session information for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Reply text followed by tool calls and attachment warnings.
    pub fn format_turn(output: &TurnOutput) -> String {
        let mut out = String::new();

        for failure in &output.attachment_failures {
            out.push_str(&Self::attachment_warning(failure));
            out.push('\n');
        }

        match &output.outcome {
            ReplyOutcome::Reply(reply) => {
                out.push_str(&reply.text);
                if reply.interrupted {
                    out.push_str(&format!(" {}", "[interrupted]".yellow()));
                }
                if reply.audio_fragments > 0 {
                    out.push_str(&format!(
                        "\n{}",
                        format!("({} audio fragment(s) saved)", reply.audio_fragments).dimmed()
                    ));
                }
            }
            ReplyOutcome::Empty {
                interrupted,
                audio_fragments,
            } => {
                let note = match (*audio_fragments, *interrupted) {
                    (0, true) => "(interrupted before any reply)".to_string(),
                    (0, false) => "(empty reply)".to_string(),
                    (n, _) => format!("(audio reply, {n} fragment(s) saved)"),
                };
                out.push_str(&note.dimmed().to_string());
            }
            ReplyOutcome::ToolCall(call) => out.push_str(&Self::tool_call(call)),
            ReplyOutcome::Failed { message, partial } => {
                if let Some(text) = partial {
                    out.push_str(text);
                    out.push('\n');
                }
                out.push_str(&format!("{} {}", "Session error:".red().bold(), message));
            }
        }

        for call in &output.tool_calls {
            out.push('\n');
            out.push_str(&Self::tool_call(call));
        }

        out
    }

    pub fn tool_call(call: &serde_json::Value) -> String {
        format!("{} {}", "tool call:".magenta().bold(), call)
    }

    pub fn attachment_warning(error: &AttachmentError) -> String {
        format!("{} {}", "attachment skipped:".yellow().bold(), error)
    }

    /// Turn failure, including the per-file reasons when nothing was sent.
    pub fn format_error(error: &RunTurnError) -> String {
        match error {
            RunTurnError::NothingToSend { failures } if !failures.is_empty() => {
                let mut out = format!("{}", "Nothing sent: every attachment failed".red().bold());
                for failure in failures {
                    out.push_str(&format!("\n  {} {}", "x".red(), failure));
                }
                out
            }
            RunTurnError::SessionFailed {
                message,
                partial: Some(text),
            } => format!(
                "{}{}\n{} {}",
                text,
                " [incomplete]".yellow(),
                "Session error:".red().bold(),
                message
            ),
            other => format!("{} {}", "Error:".red().bold(), other),
        }
    }

    pub fn format_status(
        ctx: &LiveContext,
        state: SessionState,
        handle: Option<&SessionHandle>,
    ) -> String {
        let session = ctx.session();
        let mut out = String::new();
        let row = |label: &str, value: &str| format!("  {:<14} {}\n", label.cyan(), value);

        out.push_str(&row("state", &Self::state_label(state)));
        if let Some(handle) = handle {
            out.push_str(&row("session", &handle.session_id));
        }
        out.push_str(&row("model", &session.model));
        out.push_str(&row("modality", session.response_modality.as_str()));
        out.push_str(&row(
            "user",
            ctx.user().map(|u| u.label()).unwrap_or("(anonymous)"),
        ));
        out.push_str(&row(
            "conversation",
            ctx.conversation_id().unwrap_or("(none)"),
        ));
        out.push_str(&row("working dir", &ctx.working_dir().display().to_string()));
        out
    }

    pub fn state_label(state: SessionState) -> String {
        match state {
            SessionState::Active => state.as_str().green().to_string(),
            SessionState::Connecting | SessionState::AwaitingSessionAck => {
                state.as_str().yellow().to_string()
            }
            SessionState::Disconnected | SessionState::Closed => state.as_str().red().to_string(),
        }
    }

    pub fn format_conversations(rows: &[ConversationSummary]) -> String {
        if rows.is_empty() {
            return "No conversations".dimmed().to_string();
        }
        rows.iter()
            .map(|row| {
                format!(
                    "{}  {}  {}",
                    row.conversation_id.yellow(),
                    if row.title.is_empty() { "(untitled)" } else { row.title.as_str() },
                    row.updated_at.as_deref().unwrap_or("").dimmed()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_domain::{AssembledReply, SessionConfig};
    use std::path::PathBuf;

    fn output(outcome: ReplyOutcome) -> TurnOutput {
        TurnOutput {
            outcome,
            tool_calls: Vec::new(),
            attachments_sent: 0,
            attachment_failures: Vec::new(),
        }
    }

    #[test]
    fn reply_text_is_shown() {
        let text = ConsoleFormatter::format_turn(&output(ReplyOutcome::Reply(AssembledReply {
            text: "Hello".into(),
            interrupted: true,
            audio_fragments: 0,
        })));
        assert!(text.starts_with("Hello"));
        assert!(text.contains("[interrupted]"));
    }

    #[test]
    fn empty_reply_is_noted() {
        let text = ConsoleFormatter::format_turn(&output(ReplyOutcome::Empty {
            interrupted: false,
            audio_fragments: 0,
        }));
        assert!(text.contains("(empty reply)"));

        let text = ConsoleFormatter::format_turn(&output(ReplyOutcome::Empty {
            interrupted: false,
            audio_fragments: 3,
        }));
        assert!(text.contains("3 fragment(s)"));
    }

    #[test]
    fn failures_and_tool_calls_are_listed() {
        let mut out = output(ReplyOutcome::Reply(AssembledReply {
            text: "ok".into(),
            interrupted: false,
            audio_fragments: 0,
        }));
        out.attachment_failures
            .push(AttachmentError::NotFound(PathBuf::from("/tmp/missing.txt")));
        out.tool_calls
            .push(serde_json::json!({ "name": "lookup" }));

        let text = ConsoleFormatter::format_turn(&out);
        assert!(text.contains("missing.txt"));
        assert!(text.contains("lookup"));
    }

    #[test]
    fn nothing_sent_lists_each_failure() {
        let error = RunTurnError::NothingToSend {
            failures: vec![
                AttachmentError::NotFound(PathBuf::from("a.txt")),
                AttachmentError::NotFound(PathBuf::from("b.txt")),
            ],
        };
        let text = ConsoleFormatter::format_error(&error);
        assert!(text.contains("a.txt"));
        assert!(text.contains("b.txt"));
    }

    #[test]
    fn session_failure_keeps_partial_text() {
        let error = RunTurnError::SessionFailed {
            message: "quota exceeded".into(),
            partial: Some("par".into()),
        };
        let text = ConsoleFormatter::format_error(&error);
        assert!(text.starts_with("par"));
        assert!(text.contains("quota exceeded"));

        let error = RunTurnError::SessionFailed {
            message: "quota exceeded".into(),
            partial: None,
        };
        assert!(ConsoleFormatter::format_error(&error).contains("quota exceeded"));
    }

    #[test]
    fn status_shows_context() {
        let ctx = LiveContext::new(SessionConfig::default(), "/work");
        let handle = SessionHandle {
            session_id: "s-9".into(),
            upstream_session_id: None,
        };
        let text = ConsoleFormatter::format_status(&ctx, SessionState::Active, Some(&handle));
        assert!(text.contains("s-9"));
        assert!(text.contains("(anonymous)"));
        assert!(text.contains("/work"));
    }

    #[test]
    fn conversation_list() {
        let rows = vec![ConversationSummary {
            conversation_id: "c1".into(),
            title: String::new(),
            updated_at: None,
        }];
        let text = ConsoleFormatter::format_conversations(&rows);
        assert!(text.contains("c1"));
        assert!(text.contains("(untitled)"));
        assert!(ConsoleFormatter::format_conversations(&[]).contains("No conversations"));
    }
}
