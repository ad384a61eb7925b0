//! Shared session state
//!
//! Thread-safe state for one viewer session, shared between the phase
//! drivers, the API handlers, and the SSE stream. Uses RwLock for
//! concurrent read access with rare writes.

use keepsake_common::events::ViewerEvent;
use keepsake_common::phase::Phase;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

/// Preload progress bookkeeping
#[derive(Debug, Clone, Copy, Default)]
pub struct PreloadStatus {
    pub loaded: usize,
    pub failed: usize,
    pub total: usize,
    pub resolved: bool,
}

impl PreloadStatus {
    /// Progress percentage; completion counts successes and failures alike
    pub fn percent(&self) -> u8 {
        if self.resolved || self.total == 0 {
            return 100;
        }
        let completed = self.loaded + self.failed;
        ((completed * 100) / self.total).min(100) as u8
    }
}

/// State shared by all components of one viewer session
pub struct SessionState {
    /// Current narrative phase
    pub phase: RwLock<Phase>,

    /// Preload progress
    pub preload: RwLock<PreloadStatus>,

    /// Last passcode rejection message, cleared on the next attempt
    pub unlock_error: RwLock<Option<String>>,

    /// Gallery cursor (None until the gallery phase starts)
    pub gallery_index: RwLock<Option<usize>>,

    /// Eased story progress, 0-100
    pub story_percent: RwLock<f32>,

    /// Reasons cursor (None until the reasons phase starts)
    pub reason_index: RwLock<Option<usize>>,

    /// Event broadcaster for SSE streams
    pub event_tx: broadcast::Sender<ViewerEvent>,

    /// Last API interaction, used by the idle prune loop
    pub last_touched: RwLock<Instant>,
}

impl SessionState {
    /// Create new session state in the loading phase
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            phase: RwLock::new(Phase::Loading),
            preload: RwLock::new(PreloadStatus::default()),
            unlock_error: RwLock::new(None),
            gallery_index: RwLock::new(None),
            story_percent: RwLock::new(0.0),
            reason_index: RwLock::new(None),
            event_tx,
            last_touched: RwLock::new(Instant::now()),
        }
    }

    /// Broadcast an event to all SSE listeners
    ///
    /// Send errors (no receivers) are ignored; a session with no connected
    /// client still advances.
    pub fn broadcast_event(&self, event: ViewerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewerEvent> {
        self.event_tx.subscribe()
    }

    pub async fn get_phase(&self) -> Phase {
        *self.phase.read().await
    }

    pub async fn get_preload(&self) -> PreloadStatus {
        *self.preload.read().await
    }

    pub async fn set_unlock_error(&self, error: Option<String>) {
        *self.unlock_error.write().await = error;
    }

    pub async fn get_unlock_error(&self) -> Option<String> {
        self.unlock_error.read().await.clone()
    }

    pub async fn set_gallery_index(&self, index: Option<usize>) {
        *self.gallery_index.write().await = index;
    }

    pub async fn set_story_percent(&self, percent: f32) {
        *self.story_percent.write().await = percent.clamp(0.0, 100.0);
    }

    pub async fn set_reason_index(&self, index: Option<usize>) {
        *self.reason_index.write().await = index;
    }

    /// Record an API interaction for idle pruning
    pub async fn touch(&self) {
        *self.last_touched.write().await = Instant::now();
    }

    pub async fn idle_for(&self) -> std::time::Duration {
        self.last_touched.read().await.elapsed()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_counts_failures_as_completed() {
        let status = PreloadStatus {
            loaded: 1,
            failed: 1,
            total: 4,
            resolved: false,
        };
        assert_eq!(status.percent(), 50);
    }

    #[test]
    fn empty_set_is_complete() {
        assert_eq!(PreloadStatus::default().percent(), 100);
    }

    #[test]
    fn resolved_pins_percent_at_hundred() {
        let status = PreloadStatus {
            loaded: 1,
            failed: 0,
            total: 10,
            resolved: true,
        };
        assert_eq!(status.percent(), 100);
    }

    #[tokio::test]
    async fn new_state_starts_loading() {
        let state = SessionState::new();
        assert_eq!(state.get_phase().await, Phase::Loading);
        assert!(state.get_unlock_error().await.is_none());
    }
}
