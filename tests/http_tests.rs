// HTTP control API tests, driven through the router without a listener.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;
use voice_coach::events::{event_queue, ControlEvent, EventReceiver, SessionEvent};
use voice_coach::session::{SessionId, SessionSnapshot, SessionStatus, SharedSnapshot};
use voice_coach::speech::{ConversationTurn, Role, SpeechState};
use voice_coach::{create_router, AppState};

fn snapshot(status: SessionStatus) -> SharedSnapshot {
    Arc::new(RwLock::new(SessionSnapshot {
        session_id: SessionId::from("conversation-1-abcdef012"),
        status,
        started_at: Utc::now(),
        speech_state: SpeechState::Listening,
        draft: "I think".to_string(),
        agent_typing: false,
        connected: true,
        camera_enabled: true,
        error: None,
        turns: vec![
            ConversationTurn::new(Role::Agent, "Tell me about yourself"),
            ConversationTurn::new(Role::User, "I am a developer"),
        ],
    }))
}

fn app(status: SessionStatus) -> (axum::Router, EventReceiver) {
    let (control, rx) = event_queue();
    (create_router(AppState::new(control, snapshot(status))), rx)
}

fn post(uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method("POST").uri(uri);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _rx) = app(SessionStatus::Active);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_session_snapshot() {
    let (app, _rx) = app(SessionStatus::Active);

    let response = app.oneshot(get("/session")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["session_id"], "conversation-1-abcdef012");
    assert_eq!(body["status"], "active");
    assert_eq!(body["speech_state"], "listening");
    assert_eq!(body["draft"], "I think");
}

#[tokio::test]
async fn test_get_transcript() {
    let (app, _rx) = app(SessionStatus::Active);

    let body = json(app.oneshot(get("/session/transcript")).await.unwrap()).await;

    let turns = body.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "agent");
    assert_eq!(turns[1]["content"], "I am a developer");
}

#[tokio::test]
async fn test_submit_message_queues_text() {
    let (app, mut rx) = app(SessionStatus::Active);

    let response = app
        .oneshot(post("/session/messages", Some(r#"{"text":"typed answer"}"#)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json(response).await["status"], "accepted");
    assert!(matches!(
        rx.try_recv(),
        Ok(SessionEvent::Control(ControlEvent::SubmitText(text))) if text == "typed answer"
    ));
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (app, mut rx) = app(SessionStatus::Active);

    let response = app
        .oneshot(post("/session/messages", Some(r#"{"text":"  "}"#)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_controls_map_to_events() {
    for (uri, expected) in [
        ("/session/speech/toggle", ControlEvent::ToggleSpeechPause),
        ("/session/camera/toggle", ControlEvent::ToggleCamera),
        ("/session/end", ControlEvent::End),
    ] {
        let (app, mut rx) = app(SessionStatus::Active);

        let response = app.oneshot(post(uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED, "{}", uri);
        match rx.try_recv() {
            Ok(SessionEvent::Control(event)) => assert_eq!(event, expected),
            other => panic!("unexpected {:?} for {}", other, uri),
        }
    }
}

#[tokio::test]
async fn test_controls_rejected_when_session_not_active() {
    let (app, mut rx) = app(SessionStatus::Ending);

    let response = app.oneshot(post("/session/end", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_controls_after_session_dropped() {
    let (app, rx) = app(SessionStatus::Active);
    drop(rx);

    let response = app.oneshot(post("/session/end", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::GONE);
}
