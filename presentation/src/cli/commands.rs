//! CLI command definitions

use clap::{Parser, ValueEnum};
use live_domain::{MediaResolution, ResponseModality};
use std::path::PathBuf;

/// Response modality requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModalityArg {
    Text,
    Audio,
}

impl From<ModalityArg> for ResponseModality {
    fn from(arg: ModalityArg) -> Self {
        match arg {
            ModalityArg::Text => ResponseModality::Text,
            ModalityArg::Audio => ResponseModality::Audio,
        }
    }
}

/// Media resolution for realtime input
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionArg {
    Low,
    Medium,
    High,
}

impl From<ResolutionArg> for MediaResolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Low => MediaResolution::Low,
            ResolutionArg::Medium => MediaResolution::Medium,
            ResolutionArg::High => MediaResolution::High,
        }
    }
}

/// CLI arguments for live-chat
#[derive(Parser, Debug)]
#[command(name = "live-chat")]
#[command(author, version, about = "Terminal client for a Live-Session model server")]
#[command(long_about = r#"
live-chat opens one streaming session with a Live-Session server and sends
each line you type as a turn. Files are attached with @path tokens:

  Summarize @notes.md
  Compare @"draft one.pdf" and @draft2.pdf

A line that is exactly @ opens an interactive file picker.

Configuration files are loaded from (in priority order):
1. --config <path>          Explicit config file
2. ./live-chat.toml         Project-level config
3. ~/.config/live-chat/config.toml   Global config

Example:
  live-chat --guest
  live-chat --register "Ada Lovelace" --email ada@example.com --password secret
  live-chat --verify-email ada@example.com --otp 123456
  live-chat --email me@example.com --password secret --conversation 66a1f0
  live-chat --user-id u-42 -m "What is in @report.pdf?"
"#)]
pub struct Cli {
    /// Send one message, print the reply and exit
    #[arg(short, long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Live-Session WebSocket endpoint (overrides [server].ws_url)
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,

    /// Directory Service base URL (overrides [server].api_url)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Model to request for the session
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Reply modality
    #[arg(long, value_enum)]
    pub modality: Option<ModalityArg>,

    /// Media resolution for realtime input
    #[arg(long, value_enum)]
    pub media_resolution: Option<ResolutionArg>,

    /// Prebuilt voice for audio replies
    #[arg(long, value_name = "NAME")]
    pub voice: Option<String>,

    /// Directory where audio replies are written
    #[arg(long, value_name = "DIR")]
    pub audio_dir: Option<PathBuf>,

    /// Sign in with this email (requires --password)
    #[arg(long, requires = "password", conflicts_with_all = ["guest", "user_id"])]
    pub email: Option<String>,

    /// Password for --email
    #[arg(long, requires = "email")]
    pub password: Option<String>,

    /// Register a new account under this full name (with --email and
    /// --password), then exit; the service mails a verification code
    #[arg(
        long,
        value_name = "FULL_NAME",
        requires = "email",
        conflicts_with_all = ["verify_email", "list_conversations"]
    )]
    pub register: Option<String>,

    /// Confirm the registration of this email with --otp, then exit
    #[arg(
        long,
        value_name = "EMAIL",
        requires = "otp",
        conflicts_with_all = ["email", "guest", "user_id", "list_conversations"]
    )]
    pub verify_email: Option<String>,

    /// Verification code mailed after --register
    #[arg(long, value_name = "CODE", requires = "verify_email")]
    pub otp: Option<String>,

    /// Sign in as a guest
    #[arg(long, conflicts_with = "user_id")]
    pub guest: bool,

    /// Act as this user id without signing in
    #[arg(long, value_name = "ID")]
    pub user_id: Option<String>,

    /// Link the session to an existing conversation
    #[arg(long, value_name = "ID", conflicts_with = "new_conversation")]
    pub conversation: Option<String>,

    /// Create a conversation with this title and link the session to it
    #[arg(long, value_name = "TITLE")]
    pub new_conversation: Option<String>,

    /// Ask the server to load the linked conversation's history
    #[arg(long)]
    pub load_context: bool,

    /// List the user's conversations and exit
    #[arg(long)]
    pub list_conversations: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append a JSONL transcript of session events to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_shot_with_login() {
        let cli = Cli::try_parse_from([
            "live-chat",
            "--email",
            "ada@example.com",
            "--password",
            "pw",
            "--conversation",
            "c-1",
            "--load-context",
            "-m",
            "hello @a.txt",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.email.as_deref(), Some("ada@example.com"));
        assert_eq!(cli.conversation.as_deref(), Some("c-1"));
        assert!(cli.load_context);
        assert_eq!(cli.message.as_deref(), Some("hello @a.txt"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn email_requires_password() {
        assert!(Cli::try_parse_from(["live-chat", "--email", "a@b.c"]).is_err());
    }

    #[test]
    fn register_needs_credentials() {
        let cli = Cli::try_parse_from([
            "live-chat",
            "--register",
            "Ada Lovelace",
            "--email",
            "ada@example.com",
            "--password",
            "pw",
        ])
        .unwrap();
        assert_eq!(cli.register.as_deref(), Some("Ada Lovelace"));
        assert!(Cli::try_parse_from(["live-chat", "--register", "Ada"]).is_err());
    }

    #[test]
    fn verify_email_needs_otp() {
        let cli = Cli::try_parse_from([
            "live-chat",
            "--verify-email",
            "ada@example.com",
            "--otp",
            "123456",
        ])
        .unwrap();
        assert_eq!(cli.verify_email.as_deref(), Some("ada@example.com"));
        assert_eq!(cli.otp.as_deref(), Some("123456"));
        assert!(Cli::try_parse_from(["live-chat", "--verify-email", "a@b.c"]).is_err());
        assert!(Cli::try_parse_from(["live-chat", "--otp", "1"]).is_err());
    }

    #[test]
    fn guest_conflicts_with_user_id() {
        assert!(Cli::try_parse_from(["live-chat", "--guest", "--user-id", "u"]).is_err());
    }

    #[test]
    fn conversation_conflicts_with_new_conversation() {
        assert!(
            Cli::try_parse_from([
                "live-chat",
                "--conversation",
                "c",
                "--new-conversation",
                "t"
            ])
            .is_err()
        );
    }

    #[test]
    fn value_enums_map_to_domain() {
        let cli = Cli::try_parse_from([
            "live-chat",
            "--modality",
            "audio",
            "--media-resolution",
            "low",
        ])
        .unwrap();
        assert_eq!(
            ResponseModality::from(cli.modality.unwrap()),
            ResponseModality::Audio
        );
        assert_eq!(
            MediaResolution::from(cli.media_resolution.unwrap()),
            MediaResolution::Low
        );
    }
}
