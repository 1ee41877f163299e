//! HTTP API for the session view (UI collaborator)
//!
//! This module provides a REST API for controlling the running session:
//! - GET /session - Current session snapshot
//! - GET /session/transcript - Conversation turns so far
//! - POST /session/messages - Submit a typed message
//! - POST /session/speech/toggle - Pause or resume agent speech
//! - POST /session/camera/toggle - Disable or enable the camera
//! - POST /session/end - End the session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
