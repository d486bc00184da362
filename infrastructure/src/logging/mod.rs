//! Structured transcript logging.
//!
//! [`JsonlConversationLogger`] appends one JSON object per
//! [`ConversationEvent`](live_application::ConversationEvent) to a file.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
