//! Reasons carousel sub-player
//!
//! Advances through the love reasons on a fixed per-item dwell, then holds
//! briefly before signalling completion. The `forward` flag on each event
//! only drives the client's slide-in direction; auto-advance always moves
//! forward.

use crate::state::SessionState;
use crate::timing::Timing;
use chrono::Utc;
use keepsake_common::events::ViewerEvent;
use keepsake_common::journey::LoveReason;
use tokio::time::sleep;
use tracing::debug;

/// Run the carousel to exhaustion; returns exactly once
pub async fn run(reasons: &[LoveReason], timing: &Timing, state: &SessionState) {
    for (index, _) in reasons.iter().enumerate() {
        state.set_reason_index(Some(index)).await;
        state.broadcast_event(ViewerEvent::ReasonShown {
            index,
            forward: true,
            timestamp: Utc::now(),
        });
        sleep(timing.reasons_item_dwell).await;
    }

    if !reasons.is_empty() {
        sleep(timing.reasons_settle).await;
    }

    debug!("Reasons exhausted after {} items", reasons.len());
    state.broadcast_event(ViewerEvent::ReasonsCompleted {
        timestamp: Utc::now(),
    });
}
