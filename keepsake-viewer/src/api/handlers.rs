//! HTTP request handlers
//!
//! Thin wrappers over the engine: resolve the session, forward the gesture,
//! serialize the response. Every lookup refreshes the session's idle clock.

use crate::api::AppContext;
use crate::engine::ViewerSession;
use crate::error::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use keepsake_common::api::{
    CreateSessionRequest, CreateSessionResponse, DeclinePosition, DeclineRequest,
    MusicToggleResponse, SessionSnapshot, UnlockRequest, UnlockResponse, VideoEndedRequest,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

async fn resolve(ctx: &AppContext, id: Uuid) -> Result<Arc<ViewerSession>> {
    let session = ctx.engine.session(id).await?;
    session.state.touch().await;
    Ok(session)
}

/// POST /session - Start a viewing session for a journey slug
pub async fn create_session(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>)> {
    let session = ctx.engine.create_session(&req.slug).await?;
    let snapshot = session.snapshot().await;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id,
            snapshot,
        }),
    ))
}

/// GET /session/:id - Current session snapshot
pub async fn get_session(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>> {
    let session = resolve(&ctx, id).await?;
    Ok(Json(session.snapshot().await))
}

/// POST /session/:id/unlock - Submit a passcode at the gate
pub async fn unlock(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>> {
    let session = resolve(&ctx, id).await?;
    let response = session.unlock(&req).await?;
    if response.unlocked {
        info!("Session {} unlocked", id);
    }
    Ok(Json(response))
}

/// POST /session/:id/accept - Accept the proposal
pub async fn accept(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let session = resolve(&ctx, id).await?;
    session.accept().await?;
    Ok(StatusCode::OK)
}

/// POST /session/:id/decline - Dodge the decline control
pub async fn decline(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<DeclineRequest>,
) -> Result<Json<DeclinePosition>> {
    let session = resolve(&ctx, id).await?;
    let position = session.decline(req.viewport).await?;
    Ok(Json(position))
}

/// POST /session/:id/music/toggle - Toggle background music
pub async fn music_toggle(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<MusicToggleResponse>> {
    let session = resolve(&ctx, id).await?;
    let playing = session.music_toggle().await;
    Ok(Json(MusicToggleResponse { playing }))
}

/// POST /session/:id/music/blocked - Client reports blocked playback
pub async fn music_blocked(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let session = resolve(&ctx, id).await?;
    session.music_blocked().await;
    Ok(StatusCode::OK)
}

/// POST /session/:id/gallery/video-ended - Client reports a video finished
pub async fn video_ended(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<VideoEndedRequest>,
) -> Result<StatusCode> {
    let session = resolve(&ctx, id).await?;
    session.video_ended(req.index);
    Ok(StatusCode::OK)
}
