use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::messages::OutboundFrame;
use crate::events::{ChannelEvent, EventSender};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("authentication required")]
    MissingCredential,

    #[error("connection to the agent was lost")]
    ConnectionLost,

    #[error("not connected to the agent")]
    NotConnected,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Underlying duplex connection
///
/// Implementations push `ChannelEvent`s (inbound frames, disconnect, errors)
/// onto the session queue handed to `connect`.
#[async_trait]
pub trait ChannelTransport: Send {
    /// Open the connection using the caller's credential
    async fn connect(&mut self, token: &str, events: EventSender) -> anyhow::Result<()>;

    /// Queue an encoded frame for sending
    fn send(&mut self, frame: String) -> anyhow::Result<()>;

    /// Close the connection and wait for it to shut down
    async fn close(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    /// Closed unexpectedly; sends are refused until a new session
    Lost,
    Closed,
}

/// Guards a transport so a session holds exactly one connection
pub struct AgentChannel {
    transport: Box<dyn ChannelTransport>,
    state: ConnectionState,
}

impl AgentChannel {
    pub fn new(transport: Box<dyn ChannelTransport>) -> Self {
        Self {
            transport,
            state: ConnectionState::Idle,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Open the connection. Returns `Ok(false)` if an attempt is already in
    /// progress or open.
    pub async fn open(
        &mut self,
        token: Option<&str>,
        events: EventSender,
    ) -> Result<bool, ChannelError> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                warn!("Agent connection already attempted, ignoring open");
                return Ok(false);
            }
            ConnectionState::Lost => return Err(ChannelError::ConnectionLost),
            ConnectionState::Idle | ConnectionState::Closed => {}
        }

        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ChannelError::MissingCredential)?;

        self.state = ConnectionState::Connecting;
        info!("Opening agent connection");

        if let Err(e) = self.transport.connect(token, events).await {
            self.state = ConnectionState::Closed;
            return Err(ChannelError::Transport(e));
        }

        self.state = ConnectionState::Connected;
        info!("Agent connection open");
        Ok(true)
    }

    /// Send a user turn
    pub fn send_text(&mut self, text: &str) -> Result<(), ChannelError> {
        match self.state {
            ConnectionState::Connected => {}
            ConnectionState::Lost => return Err(ChannelError::ConnectionLost),
            _ => return Err(ChannelError::NotConnected),
        }

        let frame = serde_json::to_string(&OutboundFrame::message(text))?;

        if let Err(e) = self.transport.send(frame) {
            warn!("Agent send failed, disabling outbound messages: {:#}", e);
            self.state = ConnectionState::Lost;
            return Err(ChannelError::Transport(e));
        }

        info!("Sent user message ({} chars)", text.len());
        Ok(())
    }

    /// Track connection-level events from the transport
    pub fn observe(&mut self, event: &ChannelEvent) {
        if *event == ChannelEvent::Disconnected
            && matches!(
                self.state,
                ConnectionState::Connecting | ConnectionState::Connected
            )
        {
            warn!("Agent connection closed unexpectedly");
            self.state = ConnectionState::Lost;
        }
    }

    /// Close the connection; a new `open` is allowed afterwards
    pub async fn close(&mut self) -> anyhow::Result<()> {
        if matches!(self.state, ConnectionState::Idle | ConnectionState::Closed) {
            return Ok(());
        }

        info!("Closing agent connection");
        let result = self.transport.close().await;
        self.state = ConnectionState::Closed;
        result
    }
}
