use super::state::AppState;
use crate::events::ControlEvent;
use crate::session::SessionStatus;
use crate::speech::ConversationTurn;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await.clone();
    (StatusCode::OK, Json(snapshot))
}

/// GET /session/transcript
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let turns: Vec<ConversationTurn> = state.snapshot.read().await.turns.clone();
    (StatusCode::OK, Json(turns))
}

/// POST /session/messages
/// Submit a typed message, handled like a spoken one
pub async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<SubmitMessageRequest>,
) -> Response {
    if req.text.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "Message text is empty");
    }

    info!("Typed message submitted ({} chars)", req.text.len());
    dispatch(&state, ControlEvent::SubmitText(req.text), "Message submitted").await
}

/// POST /session/speech/toggle
pub async fn toggle_speech(State(state): State<AppState>) -> Response {
    dispatch(&state, ControlEvent::ToggleSpeechPause, "Agent speech toggled").await
}

/// POST /session/camera/toggle
pub async fn toggle_camera(State(state): State<AppState>) -> Response {
    dispatch(&state, ControlEvent::ToggleCamera, "Camera toggled").await
}

/// POST /session/end
pub async fn end_session(State(state): State<AppState>) -> Response {
    info!("End of session requested over HTTP");
    dispatch(&state, ControlEvent::End, "Ending session").await
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn dispatch(state: &AppState, event: ControlEvent, message: &str) -> Response {
    let status = state.snapshot.read().await.status;
    if status != SessionStatus::Active {
        return error(
            StatusCode::CONFLICT,
            &format!("Session is not active ({:?})", status),
        );
    }

    if !state.control.control(event) {
        warn!("Session queue closed, control dropped");
        return error(StatusCode::GONE, "Session has ended");
    }

    (
        StatusCode::ACCEPTED,
        Json(ControlResponse {
            status: "accepted".to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
