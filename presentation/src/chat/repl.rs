//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::ReplCommand;
use super::picker::{Selection, ask_yes_no, pick_files};
use crate::ConsoleFormatter;
use crate::ProgressReporter;
use colored::Colorize;
use live_application::{
    LiveContext, LiveGateway, LiveSession, NoProgress, RunTurnError, RunTurnUseCase,
    TurnInput, TurnProgressNotifier,
};
use live_domain::SessionState;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Interactive chat REPL
pub struct ChatRepl {
    gateway: Arc<dyn LiveGateway>,
    run_turn: RunTurnUseCase,
    ctx: LiveContext,
    session: Option<Box<dyn LiveSession>>,
    show_progress: bool,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    pub fn new(gateway: Arc<dyn LiveGateway>, run_turn: RunTurnUseCase, ctx: LiveContext) -> Self {
        Self {
            gateway,
            run_turn,
            ctx,
            session: None,
            show_progress: true,
            history_path: dirs::data_dir().map(|p| p.join("live-chat").join("history.txt")),
        }
    }

    /// Start with an already negotiated session
    pub fn with_session(mut self, session: Box<dyn LiveSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Override the history file location
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_path = path;
        }
        self
    }

    /// Run the interactive REPL
    pub async fn run(mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        if self.handle_command(command).await {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    let input = if line == "@" {
                        match pick_files(&mut rl) {
                            Selection::Chosen { paths, message } => {
                                TurnInput::Selected { paths, message }
                            }
                            Selection::Cancelled => {
                                println!("{}", "Selection cancelled".dimmed());
                                continue;
                            }
                        }
                    } else {
                        TurnInput::Text(line.to_string())
                    };

                    if self.process_turn(input).await
                        && ask_yes_no(&mut rl, "Connection lost. Reconnect?")
                    {
                        self.reconnect().await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = rl.save_history(path);
        }
        if let Some(session) = self.session.take() {
            session.disconnect().await;
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              live-chat - Chat Mode          │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("{}", self.status_text());
        println!("{}", ReplCommand::help_text());
        println!();
    }

    fn status_text(&self) -> String {
        let session = self.session.as_deref();
        ConsoleFormatter::format_status(
            &self.ctx,
            session.map_or(SessionState::Disconnected, |s| s.state()),
            session.and_then(|s| s.handle()).as_ref(),
        )
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                true
            }
            ReplCommand::Help => {
                println!();
                println!("{}", ReplCommand::help_text());
                println!();
                false
            }
            ReplCommand::Status => {
                println!();
                println!("{}", self.status_text());
                false
            }
            ReplCommand::Reconnect => {
                self.reconnect().await;
                false
            }
            ReplCommand::Unknown(name) => {
                println!("Unknown command: {}", name);
                println!("Type /help for available commands");
                false
            }
        }
    }

    /// Run one turn and print the result. Returns true when the session is
    /// gone and a reconnect should be offered.
    async fn process_turn(&self, input: TurnInput) -> bool {
        let Some(session) = self.session.as_deref() else {
            println!("Not connected. Use /reconnect to open a session.");
            return false;
        };

        println!();
        let result = if self.show_progress {
            let progress = ProgressReporter::new();
            let result = self.execute(session, input, &progress).await;
            progress.on_reply_done();
            result
        } else {
            self.execute(session, input, &NoProgress).await
        };

        let lost = match result {
            Ok(output) => {
                println!("{}", ConsoleFormatter::format_turn(&output));
                false
            }
            Err(RunTurnError::NothingToSend { failures }) if failures.is_empty() => {
                debug!("Nothing to send");
                false
            }
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::format_error(&e));
                matches!(&e, RunTurnError::GatewayError(g) if g.is_transport_failure())
                    || session.state() != SessionState::Active
            }
        };
        println!();
        lost
    }

    async fn execute(
        &self,
        session: &dyn LiveSession,
        input: TurnInput,
        progress: &dyn TurnProgressNotifier,
    ) -> Result<live_application::TurnOutput, RunTurnError> {
        self.run_turn
            .execute(session, &self.ctx, input, progress)
            .await
    }

    /// Drop the current session and negotiate a fresh one with the same context.
    async fn reconnect(&mut self) {
        if let Some(old) = self.session.take() {
            old.disconnect().await;
        }
        println!("Connecting...");
        match self.gateway.open_session(self.ctx.session()).await {
            Ok(session) => {
                if let Some(handle) = session.handle() {
                    println!("{} session {}", "Connected:".green(), handle.session_id);
                }
                self.session = Some(session);
            }
            Err(e) => eprintln!("{} {}", "Reconnect failed:".red().bold(), e),
        }
    }
}
