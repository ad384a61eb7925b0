//! Phase sequencer
//!
//! Owns the session's phase variable and the single driver-task slot. A
//! transition is atomic with respect to timer cleanup: the exiting phase's
//! driver guard is replaced (and therefore aborted) under the same lock
//! that flips the phase, so no two phases' timers are ever live at once.

use crate::engine::timer::TaskGuard;
use crate::error::{Error, Result};
use crate::state::SessionState;
use chrono::Utc;
use keepsake_common::events::ViewerEvent;
use keepsake_common::phase::Phase;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Per-session phase state machine driver
pub struct Sequencer {
    state: Arc<SessionState>,
    /// Driver task of the current phase; replacing it aborts the old one
    driver: Mutex<Option<TaskGuard>>,
}

impl Sequencer {
    pub fn new(state: Arc<SessionState>) -> Self {
        Self {
            state,
            driver: Mutex::new(None),
        }
    }

    /// Install the initial driver task (loading phase, at session start)
    pub async fn install_driver(&self, guard: TaskGuard) {
        *self.driver.lock().await = Some(guard);
    }

    /// Attempt the transition `from -> to`
    ///
    /// Returns Ok(false) when the session is no longer in `from` (a stale
    /// completion signal); the transition table rejects illegal pairs.
    /// `make_driver` builds the entering phase's driver after the phase has
    /// flipped, while the slot lock is still held.
    ///
    /// This is routinely called from inside the exiting phase's own driver
    /// task; the slot assignment aborts that task at its next yield point,
    /// so drivers must not await anything after their advance call.
    pub async fn advance<F>(&self, from: Phase, to: Phase, make_driver: F) -> Result<bool>
    where
        F: FnOnce() -> Option<TaskGuard>,
    {
        let mut slot = self.driver.lock().await;
        {
            let mut phase = self.state.phase.write().await;
            if *phase != from {
                debug!(
                    "Ignoring stale transition {} -> {} (session is in {})",
                    from, to, *phase
                );
                return Ok(false);
            }
            if !from.permits(to) {
                return Err(Error::InvalidState(format!(
                    "illegal transition {} -> {}",
                    from, to
                )));
            }
            *phase = to;
        }
        *slot = make_driver();
        drop(slot);

        info!("Phase transition: {} -> {}", from, to);
        self.state.broadcast_event(ViewerEvent::PhaseChanged {
            phase: to,
            timestamp: Utc::now(),
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn sequencer() -> (Arc<SessionState>, Sequencer) {
        let state = Arc::new(SessionState::new());
        let seq = Sequencer::new(Arc::clone(&state));
        (state, seq)
    }

    #[tokio::test]
    async fn legal_transition_flips_phase_and_emits() {
        let (state, seq) = sequencer();
        let mut rx = state.subscribe_events();

        let advanced = seq.advance(Phase::Loading, Phase::Splash, || None).await.unwrap();
        assert!(advanced);
        assert_eq!(state.get_phase().await, Phase::Splash);

        match rx.try_recv().unwrap() {
            ViewerEvent::PhaseChanged { phase, .. } => assert_eq!(phase, Phase::Splash),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn stale_completion_is_ignored() {
        let (state, seq) = sequencer();
        seq.advance(Phase::Loading, Phase::Splash, || None).await.unwrap();

        // A completion signal arriving for a phase already exited
        let advanced = seq.advance(Phase::Loading, Phase::Splash, || None).await.unwrap();
        assert!(!advanced);
        assert_eq!(state.get_phase().await, Phase::Splash);
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected() {
        let (state, seq) = sequencer();
        let err = seq
            .advance(Phase::Loading, Phase::Accepted, || None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(state.get_phase().await, Phase::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn transition_aborts_the_exiting_phase_timer() {
        let (_state, seq) = sequencer();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        seq.install_driver(TaskGuard::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.store(true, Ordering::SeqCst);
        }))
        .await;

        seq.advance(Phase::Loading, Phase::Splash, || None).await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
