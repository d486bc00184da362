//! Reassembly of streamed model output into whole replies.

pub mod assembler;
pub mod event;

pub use assembler::{AssembledReply, ReplyOutcome, ResponseAssembler};
pub use event::LiveEvent;
