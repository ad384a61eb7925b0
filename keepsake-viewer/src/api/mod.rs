//! REST API for the journey viewer
//!
//! Session lifecycle, gate/decision gestures, and the SSE event stream.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::ViewerEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    /// Viewer engine (session registry)
    pub engine: Arc<ViewerEngine>,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Session lifecycle
            .route("/session", post(handlers::create_session))
            .route("/session/:id", get(handlers::get_session))

            // Gate
            .route("/session/:id/unlock", post(handlers::unlock))

            // Decision
            .route("/session/:id/accept", post(handlers::accept))
            .route("/session/:id/decline", post(handlers::decline))

            // Music control
            .route("/session/:id/music/toggle", post(handlers::music_toggle))
            .route("/session/:id/music/blocked", post(handlers::music_blocked))

            // Gallery playback signals
            .route("/session/:id/gallery/video-ended", post(handlers::video_ended))

            // SSE events
            .route("/session/:id/events", get(sse::event_stream))
        )
        .with_state(ctx)

        // Request tracing
        .layer(TraceLayer::new_for_http())

        // The viewer page may be served from a different origin
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "keepsake-viewer",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": ctx.engine.session_count().await,
    }))
}
