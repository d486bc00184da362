//! CLI entrypoint for live-chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use live_application::{
    ConversationLogger, DirectoryPort, IngestAttachmentsUseCase, LiveContext, LiveGateway,
    NoConversationLogger, NoProgress, RunTurnError, RunTurnUseCase, TurnInput,
    TurnProgressNotifier, UserIdentity,
};
use live_domain::{MediaResolution, ResponseModality, SessionConfig};
use live_infrastructure::{
    AudioSink, ConfigLoader, DirectoryClient, FileAudioSink, FileConfig, JsonlConversationLogger,
    NoAudioSink, WsLiveGateway,
};
use live_presentation::{ChatRepl, Cli, ConsoleFormatter, ProgressReporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const CONVERSATION_LIST_LIMIT: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };
    apply_overrides(&mut config, &cli);

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config: {issue}");
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    info!("Starting live-chat against {}", config.server.ws_url);

    // === Dependency Injection ===
    let directory = Arc::new(DirectoryClient::new(config.server.api_url.clone()));

    if let Some(full_name) = &cli.register {
        let (Some(email), Some(password)) = (&cli.email, &cli.password) else {
            bail!("--register needs --email and --password");
        };
        let message = directory
            .register(full_name, email, password)
            .await
            .context("Registration failed")?;
        println!("{message}");
        println!("Confirm with: live-chat --verify-email {email} --otp <CODE>");
        return Ok(());
    }
    if let (Some(email), Some(otp)) = (&cli.verify_email, &cli.otp) {
        let message = directory
            .verify_email(email, otp)
            .await
            .context("Email verification failed")?;
        println!("{message}");
        return Ok(());
    }

    let user = sign_in(&cli, directory.as_ref()).await?;

    if cli.list_conversations {
        let user = user.context("--list-conversations needs --email, --guest or --user-id")?;
        let rows = directory
            .list_conversations(&user, CONVERSATION_LIST_LIMIT)
            .await?;
        println!("{}", ConsoleFormatter::format_conversations(&rows));
        return Ok(());
    }

    let session_config = config.session.to_session_config()?;
    let conversation_id =
        resolve_conversation(&cli, directory.as_ref(), user.as_ref(), &session_config).await?;
    let session_config = session_config.with_conversation(
        conversation_id,
        cli.load_context || config.session.load_conversation_context,
    );

    let working_dir = std::env::current_dir().context("Cannot determine working directory")?;
    let ctx = LiveContext::new(session_config, working_dir)
        .with_user(user)
        .with_timeouts(config.timeouts.to_timeouts())
        .with_attachments(config.attachments.to_settings());

    let conversation_logger: Arc<dyn ConversationLogger> = match &cli.conversation_log {
        Some(path) => {
            let logger = JsonlConversationLogger::open(path)
                .with_context(|| format!("Cannot open conversation log {}", path.display()))?;
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    };

    let audio_sink = audio_sink(&config, ctx.session());

    let gateway: Arc<dyn LiveGateway> = Arc::new(
        WsLiveGateway::new(config.server.ws_url.clone(), *ctx.timeouts())
            .with_audio_sink(audio_sink)
            .with_conversation_logger(conversation_logger.clone()),
    );

    let run_turn = RunTurnUseCase::new(IngestAttachmentsUseCase::new(directory.clone()))
        .with_conversation_logger(conversation_logger);

    let session = gateway
        .open_session(ctx.session())
        .await
        .context("Could not open a live session")?;

    // Single message mode
    if let Some(message) = cli.message.clone() {
        let result = if cli.quiet {
            run_turn
                .execute(session.as_ref(), &ctx, TurnInput::Text(message), &NoProgress)
                .await
        } else {
            let progress = ProgressReporter::new();
            let result = run_turn
                .execute(session.as_ref(), &ctx, TurnInput::Text(message), &progress)
                .await;
            progress.on_reply_done();
            result
        };
        session.disconnect().await;

        return match result {
            Ok(output) => {
                println!("{}", ConsoleFormatter::format_turn(&output));
                Ok(())
            }
            Err(RunTurnError::NothingToSend { failures }) if failures.is_empty() => {
                bail!("Nothing to send: the message is empty")
            }
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::format_error(&e));
                Err(e.into())
            }
        };
    }

    let history = config.repl.history_file.as_deref().map(expand_home);
    let repl = ChatRepl::new(gateway, run_turn, ctx)
        .with_session(session)
        .with_progress(!cli.quiet && config.repl.show_progress)
        .with_history_file(history);

    repl.run().await?;
    Ok(())
}

/// Initialize logging based on verbosity level; `-v` flags win over `RUST_LOG`.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// CLI flags override file values.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(url) = &cli.ws_url {
        config.server.ws_url = url.clone();
    }
    if let Some(url) = &cli.api_url {
        config.server.api_url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.session.model = model.clone();
    }
    if let Some(modality) = cli.modality {
        config.session.response_modality = ResponseModality::from(modality).as_str().to_string();
    }
    if let Some(resolution) = cli.media_resolution {
        config.session.media_resolution = MediaResolution::from(resolution).as_str().to_string();
    }
    if let Some(voice) = &cli.voice {
        config.session.voice = Some(voice.clone());
    }
    if let Some(dir) = &cli.audio_dir {
        config.attachments.audio_output_dir = Some(dir.display().to_string());
    }
}

async fn sign_in(cli: &Cli, directory: &dyn DirectoryPort) -> Result<Option<UserIdentity>> {
    let user = if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        Some(directory.login(email, password).await.context("Login failed")?)
    } else if cli.guest {
        Some(directory.guest_login().await.context("Guest login failed")?)
    } else {
        cli.user_id.as_deref().map(UserIdentity::anonymous)
    };

    if let Some(user) = &user {
        info!("Acting as {}", user.label());
    }
    Ok(user)
}

async fn resolve_conversation(
    cli: &Cli,
    directory: &dyn DirectoryPort,
    user: Option<&UserIdentity>,
    session: &SessionConfig,
) -> Result<Option<String>> {
    if let Some(id) = &cli.conversation {
        return Ok(Some(id.clone()));
    }
    let Some(title) = &cli.new_conversation else {
        if cli.load_context {
            warn!("--load-context has no effect without --conversation");
        }
        return Ok(None);
    };
    let user = user.context("--new-conversation needs --email, --guest or --user-id")?;
    let conversation = directory
        .create_conversation(user, title, &session.model)
        .await
        .context("Could not create conversation")?;
    println!(
        "Created conversation {} ({})",
        conversation.conversation_id, conversation.title
    );
    Ok(Some(conversation.conversation_id))
}

/// Audio replies go to the configured directory; audio sessions without one
/// fall back to the platform data dir.
fn audio_sink(config: &FileConfig, session: &SessionConfig) -> Arc<dyn AudioSink> {
    let dir = config
        .attachments
        .audio_output_dir
        .as_deref()
        .map(expand_home)
        .or_else(|| {
            (session.response_modality == ResponseModality::Audio).then(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("live-chat")
                    .join("audio")
            })
        });
    match dir {
        Some(dir) => {
            info!("Audio replies are written to {}", dir.display());
            Arc::new(FileAudioSink::new(dir))
        }
        None => Arc::new(NoAudioSink),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
