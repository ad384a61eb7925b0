//! Event types for the Keepsake viewer event system
//!
//! Every state change a client needs to render is broadcast as a
//! `ViewerEvent` and streamed over SSE. Events carry their own timestamps
//! so a reconnecting client can order what it missed.

use crate::api::SessionSnapshot;
use crate::journey::MediaKind;
use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Viewer event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerEvent {
    /// Initial state sent on SSE connection
    InitialState {
        snapshot: SessionSnapshot,
        timestamp: DateTime<Utc>,
    },

    /// The session moved to a new narrative phase
    PhaseChanged {
        phase: Phase,
        timestamp: DateTime<Utc>,
    },

    /// One more asset finished loading (or failed; both count)
    PreloadProgress {
        loaded: usize,
        failed: usize,
        total: usize,
        percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// Preloading resolved, by completion or by ceiling timeout
    PreloadResolved {
        loaded: usize,
        failed: usize,
        total: usize,
        timed_out: bool,
        timestamp: DateTime<Utc>,
    },

    /// The gallery cursor moved to a new item
    GalleryItemShown {
        index: usize,
        kind: MediaKind,
        timestamp: DateTime<Utc>,
    },

    /// The gallery exhausted its sequence
    GalleryCompleted { timestamp: DateTime<Utc> },

    /// Eased story scroll progress, 0-100
    StoryProgress {
        percent: f32,
        timestamp: DateTime<Utc>,
    },

    /// The story scroller finished its read-through
    StoryCompleted { timestamp: DateTime<Utc> },

    /// The reasons cursor moved to a new item
    ReasonShown {
        index: usize,
        /// Whether the cursor moved forward (drives slide direction only)
        forward: bool,
        timestamp: DateTime<Utc>,
    },

    /// The reasons carousel exhausted its sequence
    ReasonsCompleted { timestamp: DateTime<Utc> },

    /// Background music play/pause state changed
    MusicStateChanged {
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// The decline control dodged to a new position
    DeclineDodged {
        x: f64,
        y: f64,
        timestamp: DateTime<Utc>,
    },

    /// The partner accepted; fire the confetti
    Celebration {
        partner_name: String,
        proposer_name: String,
        timestamp: DateTime<Utc>,
    },
}

impl ViewerEvent {
    /// Event type string used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            ViewerEvent::InitialState { .. } => "InitialState",
            ViewerEvent::PhaseChanged { .. } => "PhaseChanged",
            ViewerEvent::PreloadProgress { .. } => "PreloadProgress",
            ViewerEvent::PreloadResolved { .. } => "PreloadResolved",
            ViewerEvent::GalleryItemShown { .. } => "GalleryItemShown",
            ViewerEvent::GalleryCompleted { .. } => "GalleryCompleted",
            ViewerEvent::StoryProgress { .. } => "StoryProgress",
            ViewerEvent::StoryCompleted { .. } => "StoryCompleted",
            ViewerEvent::ReasonShown { .. } => "ReasonShown",
            ViewerEvent::ReasonsCompleted { .. } => "ReasonsCompleted",
            ViewerEvent::MusicStateChanged { .. } => "MusicStateChanged",
            ViewerEvent::DeclineDodged { .. } => "DeclineDodged",
            ViewerEvent::Celebration { .. } => "Celebration",
        }
    }
}
