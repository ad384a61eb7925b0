//! Shared API request/response types
//!
//! Used by the viewer service handlers and by any client that talks to it.
//! The journey passcode never appears in any of these types.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// POST /api/v1/session request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub slug: String,
}

/// POST /api/v1/session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub snapshot: SessionSnapshot,
}

/// Public view of a session's current state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: Phase,
    /// Whether the lock UI is still showing
    pub locked: bool,
    pub partner_name: String,
    pub proposer_name: String,
    /// Preload progress, 0-100
    pub preload_percent: u8,
    pub gallery_count: usize,
    pub reason_count: usize,
    /// Current gallery cursor, None before the gallery phase starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_index: Option<usize>,
    /// Eased story scroll progress, 0-100
    pub story_percent: f32,
    /// Current reasons cursor, None before the reasons phase starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_index: Option<usize>,
    /// Whether background music resolved during preload
    pub music_available: bool,
    pub music_playing: bool,
    /// Last passcode rejection, cleared on the next attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_error: Option<String>,
    pub accepted: bool,
}

/// POST /api/v1/session/:id/unlock request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub passcode: String,
}

/// POST /api/v1/session/:id/unlock response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// POST /api/v1/session/:id/decline request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineRequest {
    pub viewport: Viewport,
}

/// New on-screen position for the decline control
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeclinePosition {
    pub x: f64,
    pub y: f64,
}

/// POST /api/v1/session/:id/gallery/video-ended request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEndedRequest {
    /// Gallery index of the video that finished playing
    pub index: usize,
}

/// POST /api/v1/session/:id/music/toggle response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicToggleResponse {
    pub playing: bool,
}
