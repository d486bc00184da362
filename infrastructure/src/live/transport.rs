//! WebSocket transport for the Live-Session endpoint.
//!
//! - [`connect`] performs the handshake under a timeout and splits the
//!   stream: a writer task owns the sink and is fed through an unbounded
//!   channel, the caller gets the read half for its reader task.
//! - [`classify_frame`] is the pure first step of the reader loop: it pulls
//!   the `type` discriminator out of a text frame, or says why the frame is
//!   unusable.

use crate::live::error::{LiveError, Result};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Both halves of an open connection.
pub struct WsConnection {
    /// Queue for outbound frames; drained in order by the writer task.
    pub outgoing: mpsc::UnboundedSender<Message>,
    pub incoming: SplitStream<WsStream>,
    pub writer: JoinHandle<()>,
}

/// Open a WebSocket to `url`, failing with [`LiveError::ConnectTimeout`]
/// when the handshake takes longer than `timeout`.
///
/// The writer task stops when `cancel` fires (sending a close frame first)
/// or when the socket rejects a write.
pub async fn connect(
    url: &str,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<WsConnection> {
    debug!("Connecting to {}", url);

    let stream = match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url)).await {
        Ok(Ok((stream, response))) => {
            debug!("WebSocket handshake complete ({})", response.status());
            stream
        }
        Ok(Err(e)) => {
            return Err(LiveError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Err(LiveError::ConnectTimeout {
                url: url.to_string(),
                after: timeout,
            });
        }
    };

    let (mut sink, incoming) = stream.split();
    let (outgoing, mut rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if let Message::Text(text) = &msg {
                        trace!("Sending frame: {}", text.as_str());
                    }
                    if let Err(e) = sink.send(msg).await {
                        warn!("WebSocket write failed: {}", e);
                        break;
                    }
                }
            }
        }
        debug!("Writer task stopped");
    });

    Ok(WsConnection {
        outgoing,
        incoming,
        writer,
    })
}

/// Classification of one inbound text frame.
#[derive(Debug, PartialEq)]
pub enum FrameKind {
    /// A JSON object with a string `type`.
    Event { kind: String, value: Value },
    /// Not JSON, not an object, or no `type`; logged and discarded.
    Malformed(String),
}

pub fn classify_frame(text: &str) -> FrameKind {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return FrameKind::Malformed(format!("invalid JSON: {e}")),
    };
    match value.get("type").and_then(Value::as_str) {
        Some(kind) => FrameKind::Event {
            kind: kind.to_string(),
            value,
        },
        None => FrameKind::Malformed("missing \"type\"".to_string()),
    }
}
