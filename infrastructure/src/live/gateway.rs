//! Live gateway implementation

use crate::live::client::LiveClient;
use crate::media::{AudioSink, NoAudioSink};
use async_trait::async_trait;
use live_application::config::LiveTimeouts;
use live_application::ports::conversation_logger::{ConversationLogger, NoConversationLogger};
use live_application::ports::live_gateway::{GatewayError, LiveGateway, LiveSession};
use live_domain::{ReplyOutcome, SessionConfig, SessionHandle, SessionState, Turn};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Opens one [`LiveClient`] connection per session.
pub struct WsLiveGateway {
    ws_url: String,
    timeouts: LiveTimeouts,
    audio_sink: Arc<dyn AudioSink>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl WsLiveGateway {
    pub fn new(ws_url: impl Into<String>, timeouts: LiveTimeouts) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeouts,
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
}

#[async_trait]
impl LiveGateway for WsLiveGateway {
    async fn open_session(
        &self,
        config: &SessionConfig,
    ) -> Result<Box<dyn LiveSession>, GatewayError> {
        info!("Opening Live session (model: {})", config.model);
        let client = LiveClient::new(self.ws_url.clone(), self.timeouts)
            .with_audio_sink(Arc::clone(&self.audio_sink))
            .with_conversation_logger(Arc::clone(&self.conversation_logger));

        if let Err(e) = client.connect(config).await {
            // The caller never sees this client, so release a transport left
            // open by an ack timeout.
            client.disconnect().await;
            return Err(e.into());
        }
        Ok(Box::new(client))
    }
}

#[async_trait]
impl LiveSession for LiveClient {
    fn handle(&self) -> Option<SessionHandle> {
        LiveClient::handle(self)
    }

    fn state(&self) -> SessionState {
        LiveClient::state(self)
    }

    async fn send_turn(&self, turn: &Turn) -> Result<(), GatewayError> {
        LiveClient::send_turn(self, turn).await.map_err(Into::into)
    }

    async fn next_outcome(&self, timeout: Duration) -> Result<ReplyOutcome, GatewayError> {
        LiveClient::next_outcome(self, timeout)
            .await
            .map_err(Into::into)
    }

    async fn drain_outcomes(&self) -> Vec<ReplyOutcome> {
        LiveClient::drain_outcomes(self).await
    }

    async fn disconnect(&self) {
        LiveClient::disconnect(self).await
    }
}
