use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::{Sink, SinkExt, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{error, info, warn};

use super::adapter::ChannelTransport;
use super::messages::decode_frame;
use crate::events::{ChannelEvent, EventSender};

pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket connection to the agent (`<url>?token=<credential>`)
pub struct WebSocketTransport {
    url: String,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    writer_task: Option<JoinHandle<()>>,
    reader_task: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outbound: None,
            writer_task: None,
            reader_task: None,
        }
    }
}

#[async_trait]
impl ChannelTransport for WebSocketTransport {
    async fn connect(&mut self, token: &str, events: EventSender) -> Result<()> {
        let url = reqwest::Url::parse_with_params(&self.url, &[("token", token)])
            .with_context(|| format!("Invalid agent URL: {}", self.url))?;

        info!("Connecting to agent at {}", self.url);

        let (stream, _response) = connect_async(url.as_str())
            .await
            .context("Failed to connect to agent")?;

        let (sink, mut source) = stream.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Message>();

        let writer_task = tokio::spawn(write_frames(sink, outbound_rx, events.clone()));

        let reader_events = events.clone();
        let reader_task = tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if let Some(event) = decode_frame(&text) {
                            reader_events.channel(event);
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!("Agent closed the connection: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Agent connection error: {}", e);
                        reader_events.channel(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            reader_events.channel(ChannelEvent::Disconnected);
        });

        self.outbound = Some(outbound_tx);
        self.writer_task = Some(writer_task);
        self.reader_task = Some(reader_task);

        events.channel(ChannelEvent::Connected);
        Ok(())
    }

    fn send(&mut self, frame: String) -> Result<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| anyhow!("Agent connection not open"))?;

        outbound
            .send(Message::Text(frame))
            .map_err(|_| anyhow!("Agent connection writer has stopped"))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(outbound) = self.outbound.take() {
            // Writer may already be gone if the server hung up
            let _ = outbound.send(Message::Close(None));
        }

        if let Some(mut writer) = self.writer_task.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, &mut writer).await {
                Ok(Err(e)) => error!("Agent writer task panicked: {}", e),
                Ok(Ok(())) => {}
                Err(_) => {
                    warn!("Agent connection stalled while closing, dropping writer");
                    writer.abort();
                }
            }
        }

        if let Some(mut reader) = self.reader_task.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut reader).await.is_err() {
                warn!("Agent did not acknowledge close, dropping connection");
                reader.abort();
            }
        }

        Ok(())
    }
}

/// Drain queued frames into the socket. A failed write ends the connection.
async fn write_frames<S>(
    mut sink: S,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: EventSender,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            error!("Failed to write to agent connection: {}", e);
            if !closing {
                events.channel(ChannelEvent::Error(format!("send failed: {}", e)));
                events.channel(ChannelEvent::Disconnected);
            }
            return;
        }
        if closing {
            break;
        }
    }

    if let Err(e) = sink.close().await {
        warn!("Failed to close agent connection cleanly: {}", e);
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(reader) = self.reader_task.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer_task.take() {
            writer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{event_queue, SessionEvent};

    #[tokio::test]
    async fn failed_write_reports_lost_connection() {
        let (events, mut rx) = event_queue();
        let (outbound, queued) = mpsc::unbounded_channel();
        let broken = Box::pin(futures::sink::unfold((), |(), _message: Message| async {
            Err::<(), _>("connection reset")
        }));

        outbound.send(Message::Text("{}".to_string())).unwrap();
        write_frames(broken, queued, events).await;

        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::Channel(ChannelEvent::Error(message))) if message.contains("connection reset")
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::Channel(ChannelEvent::Disconnected))
        ));
    }
}
