//! Live session client: one WebSocket connection carrying one session.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──open──▶ AwaitingSessionAck ──session_created──▶ Active
//!      ▲                        │                        │                                 │
//!      └──── timeout / error ───┘                        └── session_error ──▶ Closed ◀────┘
//!                                                                               (close / disconnect)
//! ```
//!
//! A background reader task owns the read half exclusively. Every valid
//! inbound frame is appended to the connection's [`Mailbox`] and, in the same
//! step, flattened into [`LiveEvent`]s that feed the [`ResponseAssembler`].
//! Assembler outcomes are queued on a channel that [`next_outcome`] reads.
//!
//! # Correlation
//!
//! The protocol carries no request ids. Session negotiation waits for the
//! first `session_created` / `session_error` / `error` entry in the Mailbox,
//! and replies are attributed to whichever turn was sent last. Only one
//! session per connection and one turn in flight are supported.
//!
//! A `session_error` or `error` frame that arrives while a reply is pending
//! ends that reply with [`ReplyOutcome::Failed`], carrying the server's
//! message and any text received so far.
//!
//! [`next_outcome`]: LiveClient::next_outcome

use crate::live::error::{LiveError, Result};
use crate::live::mailbox::Mailbox;
use crate::live::protocol::{self, InboundMessage, live_events};
use crate::live::transport::{self, FrameKind, classify_frame};
use crate::media::{AudioSink, NoAudioSink};
use futures::StreamExt;
use futures::stream::SplitStream;
use live_application::config::LiveTimeouts;
use live_application::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use live_domain::{
    LiveEvent, ReplyOutcome, ResponseAssembler, SessionConfig, SessionHandle, SessionState, Turn,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Mailbox kinds that end session negotiation.
const SESSION_ACK_KINDS: &[&str] = &["session_created", "session_error", "error"];

/// State shared between the client and its reader task.
struct Shared {
    state: RwLock<SessionState>,
    handle: RwLock<Option<SessionHandle>>,
    /// Bumped on every connect so a stale reader never touches a newer connection.
    generation: AtomicU64,
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *current != state {
            debug!("Session state: {} -> {}", *current, state);
            *current = state;
        }
    }

    fn set_handle(&self, handle: Option<SessionHandle>) {
        *self.handle.write().unwrap_or_else(|e| e.into_inner()) = handle;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// One open connection; dropping it stops both background tasks.
struct Connection {
    outgoing: mpsc::UnboundedSender<Message>,
    mailbox: Arc<Mailbox>,
    cancel: CancellationToken,
    _reader: JoinHandle<()>,
    _writer: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Client for the Live-Session WebSocket endpoint.
pub struct LiveClient {
    ws_url: String,
    timeouts: LiveTimeouts,
    shared: Arc<Shared>,
    connection: tokio::sync::Mutex<Option<Connection>>,
    outcomes: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<ReplyOutcome>>>,
    assembler: Arc<Mutex<ResponseAssembler>>,
    audio_sink: Arc<dyn AudioSink>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl LiveClient {
    pub fn new(ws_url: impl Into<String>, timeouts: LiveTimeouts) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeouts,
            shared: Arc::new(Shared {
                state: RwLock::new(SessionState::Disconnected),
                handle: RwLock::new(None),
                generation: AtomicU64::new(0),
            }),
            connection: tokio::sync::Mutex::new(None),
            outcomes: tokio::sync::Mutex::new(None),
            assembler: Arc::new(Mutex::new(ResponseAssembler::new())),
            audio_sink: Arc::new(NoAudioSink),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio_sink = sink;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn handle(&self) -> Option<SessionHandle> {
        self.shared
            .handle
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Mailbox of the current connection, if any.
    pub async fn mailbox(&self) -> Option<Arc<Mailbox>> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|c| Arc::clone(&c.mailbox))
    }

    /// Open the connection and negotiate the session.
    ///
    /// Allowed from `Disconnected` or `Closed`. A handshake that fails or
    /// exceeds the connect timeout returns the client to `Disconnected`. If
    /// `session_created` does not arrive within the ack timeout the error is
    /// returned but the transport stays open in `AwaitingSessionAck`.
    pub async fn connect(&self, config: &SessionConfig) -> Result<SessionHandle> {
        let mut connection = self.connection.lock().await;

        let state = self.shared.state();
        if !state.can_connect() {
            return Err(LiveError::InvalidState {
                action: "connect",
                state,
            });
        }
        let frame = protocol::create_session_frame(config)?;

        // Release whatever a previous connection left behind.
        connection.take();
        self.shared.set_handle(None);
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.shared.set_state(SessionState::Connecting);
        let cancel = CancellationToken::new();
        let ws = match transport::connect(&self.ws_url, self.timeouts.connect, cancel.clone()).await
        {
            Ok(ws) => ws,
            Err(e) => {
                warn!("Connect failed: {}", e);
                self.shared.set_state(SessionState::Disconnected);
                return Err(e);
            }
        };
        info!("Connected to {}", self.ws_url);

        let mailbox = Arc::new(Mailbox::new());
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        *self.assembler.lock().unwrap_or_else(|e| e.into_inner()) = ResponseAssembler::new();
        *self.outcomes.lock().await = Some(outcome_rx);

        let reader = ReaderTask {
            generation,
            shared: Arc::clone(&self.shared),
            mailbox: Arc::clone(&mailbox),
            assembler: Arc::clone(&self.assembler),
            outcomes: outcome_tx,
            audio_sink: Arc::clone(&self.audio_sink),
            cancel: cancel.clone(),
        };
        let reader = tokio::spawn(reader.run(ws.incoming));

        *connection = Some(Connection {
            outgoing: ws.outgoing,
            mailbox: Arc::clone(&mailbox),
            cancel,
            _reader: reader,
            _writer: ws.writer,
        });

        debug!("create_session ({} bytes)", frame.len());
        trace!("create_session: {}", frame);
        if let Err(e) = self.send_frame(connection.as_ref(), frame) {
            connection.take();
            self.shared.set_state(SessionState::Disconnected);
            return Err(e);
        }
        self.shared.set_state(SessionState::AwaitingSessionAck);
        drop(connection);

        let entry = mailbox
            .wait_for_any(SESSION_ACK_KINDS, "session_created", self.timeouts.session_ack)
            .await?;

        match entry.message {
            InboundMessage::SessionCreated {
                session_id,
                upstream_session_id,
            } => {
                let handle = SessionHandle {
                    session_id,
                    upstream_session_id,
                };
                self.shared.set_handle(Some(handle.clone()));
                self.shared.set_state(SessionState::Active);
                info!("Session created: {}", handle.session_id);
                self.conversation_logger.log(ConversationEvent::new(
                    "session_created",
                    serde_json::json!({
                        "session_id": handle.session_id,
                        "upstream_session_id": handle.upstream_session_id,
                        "model": config.model,
                        "modality": config.response_modality.as_str(),
                        "conversation_id": config.conversation_id,
                    }),
                ));
                Ok(handle)
            }
            other => {
                let message = other
                    .error_text()
                    .unwrap_or_else(|| "session negotiation failed".to_string());
                warn!("Session negotiation failed: {}", message);
                self.connection.lock().await.take();
                self.shared.set_state(SessionState::Closed);
                Err(LiveError::Session(message))
            }
        }
    }

    /// Send one complete user turn. Requires `Active`.
    pub async fn send_turn(&self, turn: &Turn) -> Result<()> {
        let connection = self.connection.lock().await;

        let state = self.shared.state();
        let handle = match (state, self.handle()) {
            (SessionState::Active, Some(handle)) => handle,
            _ => {
                return Err(LiveError::InvalidState {
                    action: "send a turn",
                    state,
                });
            }
        };

        let frame = protocol::send_message_frame(&handle.session_id, turn)?;
        debug!(
            "send_message: {} part(s), {} bytes",
            turn.parts().len(),
            frame.len()
        );
        trace!("send_message: {}", frame);

        // Arm before sending so a fast reply is never lost.
        self.assembler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .expect_reply();
        self.send_frame(connection.as_ref(), frame)
    }

    fn send_frame(&self, connection: Option<&Connection>, frame: String) -> Result<()> {
        let connection = connection.ok_or(LiveError::TransportClosed)?;
        connection
            .outgoing
            .send(Message::Text(frame.into()))
            .map_err(|_| LiveError::TransportClosed)
    }

    /// Wait for the next assembler outcome.
    pub async fn next_outcome(&self, timeout: Duration) -> Result<ReplyOutcome> {
        let mut outcomes = self.outcomes.lock().await;
        let Some(rx) = outcomes.as_mut() else {
            return Err(LiveError::InvalidState {
                action: "wait for a reply",
                state: self.shared.state(),
            });
        };
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => Err(LiveError::TransportClosed),
            Err(_) => Err(LiveError::Timeout {
                what: "reply",
                after: timeout,
            }),
        }
    }

    /// Take every queued outcome without waiting.
    pub async fn drain_outcomes(&self) -> Vec<ReplyOutcome> {
        let mut outcomes = self.outcomes.lock().await;
        let mut drained = Vec::new();
        if let Some(rx) = outcomes.as_mut() {
            while let Ok(outcome) = rx.try_recv() {
                drained.push(outcome);
            }
        }
        drained
    }

    /// Close the connection. Idempotent; always leaves `Closed`.
    pub async fn disconnect(&self) {
        let mut connection = self.connection.lock().await;
        if let Some(conn) = connection.take() {
            info!("Disconnecting from {}", self.ws_url);
            drop(conn);
        }
        self.shared.set_handle(None);
        self.shared.set_state(SessionState::Closed);
    }
}

/// Background reader, single owner of the socket read half.
struct ReaderTask {
    generation: u64,
    shared: Arc<Shared>,
    mailbox: Arc<Mailbox>,
    assembler: Arc<Mutex<ResponseAssembler>>,
    outcomes: mpsc::UnboundedSender<ReplyOutcome>,
    audio_sink: Arc<dyn AudioSink>,
    cancel: CancellationToken,
}

impl ReaderTask {
    async fn run(self, mut incoming: SplitStream<transport::WsStream>) {
        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => break,
                frame = incoming.next() => frame,
            };
            match frame {
                Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()),
                Some(Ok(Message::Binary(bytes))) => {
                    debug!("Ignoring {}-byte binary frame", bytes.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Server closed the connection: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket read failed: {}", e);
                    break;
                }
                None => {
                    info!("WebSocket stream ended");
                    break;
                }
            }
        }

        self.mailbox.close();
        if self.shared.is_current(self.generation) {
            self.shared.set_handle(None);
            self.shared.set_state(SessionState::Closed);
        }
        debug!("Reader task stopped");
    }

    fn handle_text(&self, text: &str) {
        trace!("Received frame: {}", text);

        let (kind, value) = match classify_frame(text) {
            FrameKind::Event { kind, value } => (kind, value),
            FrameKind::Malformed(reason) => {
                warn!("Discarding malformed frame ({}): {}", reason, truncate(text));
                return;
            }
        };

        let message: InboundMessage = match serde_json::from_value(value) {
            Ok(m) => m,
            Err(e) => {
                warn!("Discarding malformed {} frame: {}", kind, e);
                return;
            }
        };

        match &message {
            InboundMessage::SessionError { .. } => {
                warn!(
                    "Session error from server: {}",
                    message.error_text().unwrap_or_default()
                );
                if self.shared.is_current(self.generation) {
                    self.shared.set_state(SessionState::Closed);
                }
            }
            InboundMessage::Error { .. } => {
                warn!("Server error: {}", message.error_text().unwrap_or_default());
            }
            InboundMessage::ContextLoaded { messages_loaded } => {
                info!("Conversation context loaded ({:?} messages)", messages_loaded);
            }
            InboundMessage::AudioSaved { audio_id } => {
                debug!("Server saved audio {:?}", audio_id);
            }
            InboundMessage::Unknown => debug!("Unhandled event type: {}", kind),
            _ => trace!("Event: {}", kind),
        }

        let events = live_events(&message);
        self.mailbox.append(kind, message);

        for event in events {
            self.dispatch(event);
        }
    }

    fn dispatch(&self, event: LiveEvent) {
        if let LiveEvent::AudioFragment { mime_type, data } = &event {
            self.audio_sink.write_fragment(mime_type, data);
        }
        if event.is_terminal() {
            self.audio_sink.finish_reply();
        }

        let outcome = self
            .assembler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .feed(event);
        if let Some(outcome) = outcome {
            debug!("Assembler outcome ready");
            let _ = self.outcomes.send(outcome);
        }
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
