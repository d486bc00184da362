//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface over one live session.

mod command;
mod picker;
mod repl;

pub use command::ReplCommand;
pub use picker::{LineSource, ReadLine, Selection, ask_yes_no, pick_files};
pub use repl::ChatRepl;
