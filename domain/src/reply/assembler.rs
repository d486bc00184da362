//! Incremental reassembly of one model reply per turn.

use super::event::LiveEvent;
use serde_json::Value;

/// Accumulator for one in-progress reply.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    text: String,
    in_progress: bool,
}

impl ResponseBuffer {
    /// Start a new reply, discarding nothing (the buffer is empty when idle).
    fn open(&mut self) {
        self.text.clear();
        self.in_progress = true;
    }

    fn append(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Take the accumulated text and return to idle.
    fn flush(&mut self) -> String {
        self.in_progress = false;
        std::mem::take(&mut self.text)
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A flushed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledReply {
    pub text: String,
    /// Flushed because the server interrupted generation.
    pub interrupted: bool,
    /// Audio fragments persisted while this reply was open.
    pub audio_fragments: usize,
}

/// What the assembler hands to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// A complete (or interrupted, partial) reply with text.
    Reply(AssembledReply),
    /// The reply ended without any text.
    Empty {
        interrupted: bool,
        audio_fragments: usize,
    },
    /// A tool call, passed through untouched.
    ToolCall(Value),
    /// The server reported an error while a reply was pending.
    Failed {
        message: String,
        /// Text received before the error, if any.
        partial: Option<String>,
    },
}

impl ReplyOutcome {
    /// Whether this outcome ends the wait for a reply.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReplyOutcome::ToolCall(_))
    }
}

/// Reassembles streamed fragments into one reply per turn.
///
/// Fragments are concatenated in arrival order. A reply is flushed exactly
/// once, on the first of `GenerationComplete` / `TurnComplete` /
/// `Interrupted` / `Failed`; later termination signals for the same reply
/// are ignored until [`expect_reply`](Self::expect_reply) is called for the
/// next turn or a new fragment opens another reply. A `TurnComplete` that
/// trails a settled reply is absorbed even after the next turn is armed, so
/// servers that send both signals as separate frames never produce a
/// spurious empty outcome. A fresh assembler expects a reply.
#[derive(Debug)]
pub struct ResponseAssembler {
    buffer: ResponseBuffer,
    expecting: bool,
    /// Set when a reply settled on something other than `TurnComplete`.
    trailing_turn_complete: bool,
    audio_fragments: usize,
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self {
            buffer: ResponseBuffer::default(),
            expecting: true,
            trailing_turn_complete: false,
            audio_fragments: 0,
        }
    }

    /// Arm the assembler for the reply to a turn that was just sent.
    pub fn expect_reply(&mut self) {
        self.expecting = true;
    }

    /// Feed one event; returns an outcome when one is ready.
    pub fn feed(&mut self, event: LiveEvent) -> Option<ReplyOutcome> {
        match event {
            LiveEvent::TextFragment(text) | LiveEvent::Transcription(text) => {
                if text.is_empty() {
                    return None;
                }
                if !self.buffer.is_in_progress() {
                    self.buffer.open();
                }
                self.buffer.append(&text);
                None
            }
            LiveEvent::AudioFragment { .. } => {
                self.audio_fragments += 1;
                self.expecting = true;
                None
            }
            LiveEvent::ToolCall(call) => Some(ReplyOutcome::ToolCall(call)),
            LiveEvent::GenerationComplete => self.settle(false),
            LiveEvent::Interrupted => self.settle(true),
            LiveEvent::TurnComplete => {
                let trailing = std::mem::take(&mut self.trailing_turn_complete);
                if trailing && !self.buffer.is_in_progress() && self.audio_fragments == 0 {
                    return None;
                }
                self.finish(false)
            }
            LiveEvent::Failed(message) => self.fail(message),
        }
    }

    fn settle(&mut self, interrupted: bool) -> Option<ReplyOutcome> {
        let outcome = self.finish(interrupted);
        self.trailing_turn_complete = true;
        outcome
    }

    fn finish(&mut self, interrupted: bool) -> Option<ReplyOutcome> {
        let audio_fragments = std::mem::take(&mut self.audio_fragments);

        if self.buffer.is_in_progress() {
            self.expecting = false;
            let text = self.buffer.flush();
            return Some(ReplyOutcome::Reply(AssembledReply {
                text,
                interrupted,
                audio_fragments,
            }));
        }

        if self.expecting {
            self.expecting = false;
            return Some(ReplyOutcome::Empty {
                interrupted,
                audio_fragments,
            });
        }

        None
    }

    /// Abandon the pending reply, keeping whatever text already arrived.
    /// Errors that arrive while nothing is pending produce no outcome.
    fn fail(&mut self, message: String) -> Option<ReplyOutcome> {
        self.audio_fragments = 0;
        self.trailing_turn_complete = false;

        let partial = self
            .buffer
            .is_in_progress()
            .then(|| self.buffer.flush());
        if partial.is_none() && !self.expecting {
            return None;
        }
        self.expecting = false;
        Some(ReplyOutcome::Failed { message, partial })
    }

    pub fn is_in_progress(&self) -> bool {
        self.buffer.is_in_progress()
    }

    /// Text accumulated so far for the open reply.
    pub fn partial_text(&self) -> &str {
        self.buffer.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> LiveEvent {
        LiveEvent::TextFragment(s.to_string())
    }

    fn feed_all(assembler: &mut ResponseAssembler, events: Vec<LiveEvent>) -> Vec<ReplyOutcome> {
        events
            .into_iter()
            .filter_map(|e| assembler.feed(e))
            .collect()
    }

    fn reply(text: &str, interrupted: bool) -> ReplyOutcome {
        ReplyOutcome::Reply(AssembledReply {
            text: text.to_string(),
            interrupted,
            audio_fragments: 0,
        })
    }

    #[test]
    fn fragments_concatenate_into_one_reply() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(
            &mut assembler,
            vec![text("Hel"), text("lo"), LiveEvent::GenerationComplete],
        );
        assert_eq!(out, vec![reply("Hello", false)]);
        assert!(!assembler.is_in_progress());
    }

    #[test]
    fn completion_without_fragments_is_one_empty_outcome() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(&mut assembler, vec![LiveEvent::GenerationComplete]);
        assert_eq!(
            out,
            vec![ReplyOutcome::Empty {
                interrupted: false,
                audio_fragments: 0
            }]
        );
    }

    #[test]
    fn interruption_flushes_partial_text() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(&mut assembler, vec![text("partial"), LiveEvent::Interrupted]);
        assert_eq!(out, vec![reply("partial", true)]);
    }

    #[test]
    fn duplicate_completion_signals_flush_once() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(
            &mut assembler,
            vec![
                text("done"),
                LiveEvent::GenerationComplete,
                LiveEvent::GenerationComplete,
                LiveEvent::Interrupted,
            ],
        );
        assert_eq!(out, vec![reply("done", false)]);
    }

    #[test]
    fn next_turn_rearms_empty_outcome() {
        let mut assembler = ResponseAssembler::new();
        feed_all(&mut assembler, vec![text("first"), LiveEvent::GenerationComplete]);

        assert_eq!(assembler.feed(LiveEvent::GenerationComplete), None);

        assembler.expect_reply();
        assert_eq!(
            assembler.feed(LiveEvent::GenerationComplete),
            Some(ReplyOutcome::Empty {
                interrupted: false,
                audio_fragments: 0
            })
        );
    }

    #[test]
    fn consecutive_replies_do_not_leak_text() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(
            &mut assembler,
            vec![
                text("one"),
                LiveEvent::GenerationComplete,
                text("two"),
                LiveEvent::GenerationComplete,
            ],
        );
        assert_eq!(out, vec![reply("one", false), reply("two", false)]);
    }

    #[test]
    fn transcription_counts_as_text_and_audio_is_side_channel() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(
            &mut assembler,
            vec![
                LiveEvent::AudioFragment {
                    mime_type: "audio/pcm".into(),
                    data: vec![0, 1, 2],
                },
                LiveEvent::Transcription("spoken".into()),
                LiveEvent::AudioFragment {
                    mime_type: "audio/pcm".into(),
                    data: vec![3],
                },
                LiveEvent::GenerationComplete,
            ],
        );
        assert_eq!(
            out,
            vec![ReplyOutcome::Reply(AssembledReply {
                text: "spoken".into(),
                interrupted: false,
                audio_fragments: 2,
            })]
        );
    }

    #[test]
    fn tool_calls_pass_through_without_touching_buffer() {
        let mut assembler = ResponseAssembler::new();
        let call = serde_json::json!({"functionCalls": [{"name": "lookup"}]});

        assert_eq!(assembler.feed(text("before ")), None);
        assert_eq!(
            assembler.feed(LiveEvent::ToolCall(call.clone())),
            Some(ReplyOutcome::ToolCall(call))
        );
        assert_eq!(assembler.partial_text(), "before ");
        assert_eq!(
            assembler.feed(LiveEvent::GenerationComplete),
            Some(reply("before ", false))
        );
    }

    #[test]
    fn empty_fragments_do_not_open_a_reply() {
        let mut assembler = ResponseAssembler::new();
        assert_eq!(assembler.feed(text("")), None);
        assert!(!assembler.is_in_progress());
    }

    #[test]
    fn tool_call_is_not_terminal() {
        assert!(!ReplyOutcome::ToolCall(Value::Null).is_terminal());
        assert!(reply("x", false).is_terminal());
    }

    #[test]
    fn trailing_turn_complete_is_absorbed_after_rearm() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(&mut assembler, vec![text("one"), LiveEvent::GenerationComplete]);
        assert_eq!(out, vec![reply("one", false)]);

        // Next turn is sent before the late signal for the first reply lands.
        assembler.expect_reply();
        assert_eq!(assembler.feed(LiveEvent::TurnComplete), None);

        let out = feed_all(&mut assembler, vec![text("two"), LiveEvent::GenerationComplete]);
        assert_eq!(out, vec![reply("two", false)]);
    }

    #[test]
    fn turn_complete_alone_still_ends_a_reply() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(&mut assembler, vec![text("solo"), LiveEvent::TurnComplete]);
        assert_eq!(out, vec![reply("solo", false)]);

        assembler.expect_reply();
        assert_eq!(
            assembler.feed(LiveEvent::TurnComplete),
            Some(ReplyOutcome::Empty {
                interrupted: false,
                audio_fragments: 0
            })
        );
    }

    #[test]
    fn failure_flushes_partial_text() {
        let mut assembler = ResponseAssembler::new();
        let out = feed_all(
            &mut assembler,
            vec![text("par"), LiveEvent::Failed("quota exceeded".into())],
        );
        assert_eq!(
            out,
            vec![ReplyOutcome::Failed {
                message: "quota exceeded".into(),
                partial: Some("par".into()),
            }]
        );
        assert!(!assembler.is_in_progress());
    }

    #[test]
    fn failure_while_idle_is_ignored() {
        let mut assembler = ResponseAssembler::new();
        feed_all(&mut assembler, vec![text("done"), LiveEvent::GenerationComplete]);
        assert_eq!(assembler.feed(LiveEvent::Failed("late".into())), None);

        assembler.expect_reply();
        assert_eq!(
            assembler.feed(LiveEvent::Failed("boom".into())),
            Some(ReplyOutcome::Failed {
                message: "boom".into(),
                partial: None,
            })
        );
    }
}
