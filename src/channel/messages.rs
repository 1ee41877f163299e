use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::events::ChannelEvent;

/// Frame sent to the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Message { content: String },
}

impl OutboundFrame {
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }
}

/// Frame received from the agent, discriminated by `type`
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl InboundFrame {
    /// Map the frame to a channel event. Unknown types yield `None`.
    pub fn into_event(self) -> Option<ChannelEvent> {
        match self.kind.as_str() {
            "connection" => Some(ChannelEvent::Greeting(
                self.message.filter(|m| !m.trim().is_empty()),
            )),
            "text_message" | "message" | "response" => {
                let body = [self.message, self.content, self.text]
                    .into_iter()
                    .flatten()
                    .find(|body| !body.trim().is_empty());
                match body {
                    Some(body) => Some(ChannelEvent::Inbound(body)),
                    None => {
                        warn!("Empty message content received");
                        None
                    }
                }
            }
            "typing_start" => Some(ChannelEvent::TypingStart),
            "typing_stop" => Some(ChannelEvent::TypingStop),
            other => {
                info!("Unknown message type: {}", other);
                None
            }
        }
    }
}

/// Parse a raw text frame into an event, logging anything unusable
pub fn decode_frame(raw: &str) -> Option<ChannelEvent> {
    match serde_json::from_str::<InboundFrame>(raw) {
        Ok(frame) => frame.into_event(),
        Err(e) => {
            error!("Failed to parse channel frame: {}", e);
            None
        }
    }
}
