//! Slash commands understood by the REPL.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Status,
    Reconnect,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`; any other line is not a command.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }
        let name = line.split_whitespace().next().unwrap_or(line);
        Some(match name {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/status" => ReplCommand::Status,
            "/reconnect" => ReplCommand::Reconnect,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(name.to_string()),
        })
    }

    pub fn help_text() -> &'static str {
        "Commands:\n  \
         /help, /h, /?     - Show this help\n  \
         /status           - Show session and conversation\n  \
         /reconnect        - Open a fresh session\n  \
         /quit, /exit, /q  - Exit chat\n\n\
         Attach files with @path or @\"path with spaces\".\n\
         A line that is just @ opens the file picker."
    }
}
