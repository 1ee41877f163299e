use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/transcript", get(handlers::get_transcript))
        // Session controls
        .route("/session/messages", post(handlers::submit_message))
        .route("/session/speech/toggle", post(handlers::toggle_speech))
        .route("/session/camera/toggle", post(handlers::toggle_camera))
        .route("/session/end", post(handlers::end_session))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
