// WebSocket transport tests against a local agent endpoint.

use futures::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::Message;
use voice_coach::channel::websocket::CLOSE_TIMEOUT;
use voice_coach::channel::{AgentChannel, ConnectionState, OutboundFrame, WebSocketTransport};
use voice_coach::events::{event_queue, ChannelEvent, EventReceiver, SessionEvent};

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/chat", listener.local_addr().unwrap());
    (listener, url)
}

async fn next_channel_event(rx: &mut EventReceiver) -> ChannelEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for channel event")
            .expect("queue closed");
        if let SessionEvent::Channel(event) = event {
            return event;
        }
    }
}

#[tokio::test]
async fn test_frames_round_trip_and_server_close_is_lost() {
    let (listener, url) = listen().await;
    let (uri_tx, uri_rx) = oneshot::channel();

    let agent = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_hdr_async(
            socket,
            |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let _ = uri_tx.send(req.uri().to_string());
                Ok(resp)
            },
        )
        .await
        .unwrap();

        let received = match ws.next().await {
            Some(Ok(Message::Text(text))) => text,
            other => panic!("unexpected frame {:?}", other),
        };

        ws.send(Message::Text(
            r#"{"type":"text_message","message":"Tell me about yourself"}"#.to_string(),
        ))
        .await
        .unwrap();
        ws.close(None).await.unwrap();

        received
    });

    let mut channel = AgentChannel::new(Box::new(WebSocketTransport::new(url)));
    let (events, mut rx) = event_queue();

    assert!(channel.open(Some("secret"), events).await.unwrap());
    assert_eq!(next_channel_event(&mut rx).await, ChannelEvent::Connected);
    assert_eq!(uri_rx.await.unwrap(), "/ws/chat?token=secret");

    channel.send_text("hello").unwrap();

    assert_eq!(
        next_channel_event(&mut rx).await,
        ChannelEvent::Inbound("Tell me about yourself".to_string())
    );
    assert_eq!(
        agent.await.unwrap(),
        serde_json::to_string(&OutboundFrame::message("hello")).unwrap()
    );

    let disconnected = next_channel_event(&mut rx).await;
    assert_eq!(disconnected, ChannelEvent::Disconnected);
    channel.observe(&disconnected);

    assert_eq!(channel.state(), ConnectionState::Lost);
    assert!(channel.send_text("anyone there?").is_err());
}

#[tokio::test]
async fn test_close_returns_when_agent_never_answers() {
    let (listener, url) = listen().await;
    let (release_tx, release_rx) = oneshot::channel::<()>();

    // Completes the handshake, then never reads again
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        let _ = release_rx.await;
        drop(ws);
    });

    let mut channel = AgentChannel::new(Box::new(WebSocketTransport::new(url)));
    let (events, mut rx) = event_queue();
    channel.open(Some("secret"), events).await.unwrap();
    assert_eq!(next_channel_event(&mut rx).await, ChannelEvent::Connected);

    let started = Instant::now();
    channel.close().await.unwrap();

    assert!(started.elapsed() < CLOSE_TIMEOUT * 2 + Duration::from_secs(1));
    assert_eq!(channel.state(), ConnectionState::Closed);
    let _ = release_tx.send(());
}

#[tokio::test]
async fn test_dropped_connection_reports_disconnect() {
    let (listener, url) = listen().await;

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        // Hang up without a close handshake
        drop(ws);
    });

    let mut channel = AgentChannel::new(Box::new(WebSocketTransport::new(url)));
    let (events, mut rx) = event_queue();
    channel.open(Some("secret"), events).await.unwrap();

    let mut saw_disconnect = false;
    for _ in 0..3 {
        let event = next_channel_event(&mut rx).await;
        channel.observe(&event);
        if event == ChannelEvent::Disconnected {
            saw_disconnect = true;
            break;
        }
    }

    assert!(saw_disconnect);
    assert_eq!(channel.state(), ConnectionState::Lost);
}
