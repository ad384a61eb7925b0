//! Audio controller
//!
//! Owns the single background-music handle for a session, independent of
//! phase. The handle is set once by the preloader when music metadata
//! resolves. The engine tracks playback *intent*; the browser performs the
//! actual playback and reports a platform autoplay rejection back through
//! `mark_blocked`, which quietly resets the state to not-playing.

use crate::state::SessionState;
use chrono::Utc;
use keepsake_common::events::ViewerEvent;
use tokio::sync::RwLock;

/// Resolved background music reference
#[derive(Debug, Clone)]
pub struct AudioHandle {
    pub url: String,
    pub content_type: Option<String>,
    /// Background music always loops
    pub looped: bool,
}

#[derive(Debug, Default)]
struct AudioControllerInner {
    handle: Option<AudioHandle>,
    playing: bool,
}

/// Background music lifecycle for one session
#[derive(Debug, Default)]
pub struct AudioController {
    inner: RwLock<AudioControllerInner>,
}

impl AudioController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the handle resolved during preload
    pub async fn set_handle(&self, handle: AudioHandle) {
        self.inner.write().await.handle = Some(handle);
    }

    pub async fn handle(&self) -> Option<AudioHandle> {
        self.inner.read().await.handle.clone()
    }

    pub async fn is_available(&self) -> bool {
        self.inner.read().await.handle.is_some()
    }

    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.playing
    }

    /// Toggle play/pause; no-op when no music resolved
    pub async fn toggle(&self, state: &SessionState) -> bool {
        let mut inner = self.inner.write().await;
        if inner.handle.is_none() {
            return false;
        }
        inner.playing = !inner.playing;
        let playing = inner.playing;
        drop(inner);

        state.broadcast_event(ViewerEvent::MusicStateChanged {
            playing,
            timestamp: Utc::now(),
        });
        playing
    }

    /// Opportunistic play attempt on the unlock gesture
    ///
    /// Optimistically marks playing; a platform rejection comes back via
    /// `mark_blocked`.
    pub async fn try_autoplay(&self, state: &SessionState) {
        let mut inner = self.inner.write().await;
        if inner.handle.is_none() || inner.playing {
            return;
        }
        inner.playing = true;
        drop(inner);

        state.broadcast_event(ViewerEvent::MusicStateChanged {
            playing: true,
            timestamp: Utc::now(),
        });
    }

    /// The client reported that the platform blocked playback
    pub async fn mark_blocked(&self, state: &SessionState) {
        let mut inner = self.inner.write().await;
        if !inner.playing {
            return;
        }
        inner.playing = false;
        drop(inner);

        state.broadcast_event(ViewerEvent::MusicStateChanged {
            playing: false,
            timestamp: Utc::now(),
        });
    }
}
