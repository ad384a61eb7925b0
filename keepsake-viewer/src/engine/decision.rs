//! Decision handler
//!
//! The terminal accept/decline interaction. Accept persists the acceptance
//! flag fire-and-forget (a network hiccup must never hold the celebration
//! hostage) and moves the session to its terminal phase. Decline never
//! changes state at all; it only relocates the decline control to a fresh
//! random spot inside the viewport.

use crate::db;
use crate::engine::ViewerSession;
use crate::error::{Error, Result};
use chrono::Utc;
use keepsake_common::api::{DeclinePosition, Viewport};
use keepsake_common::events::ViewerEvent;
use keepsake_common::phase::Phase;
use rand::Rng;
use tracing::error;

/// On-screen size reserved for the decline control when dodging
const CONTROL_WIDTH: f64 = 100.0;
const CONTROL_HEIGHT: f64 = 50.0;

/// Accept the proposal
///
/// Duplicate accepts (double click, retried request) succeed without
/// effect; the persisted flag is monotonic and the write is at-most-once
/// best-effort, logged on failure.
pub async fn accept(session: &ViewerSession) -> Result<()> {
    let phase = session.state.get_phase().await;
    if phase == Phase::Accepted {
        return Ok(());
    }
    if phase != Phase::Proposal {
        return Err(Error::InvalidState(format!(
            "cannot accept during {} phase",
            phase
        )));
    }

    let advanced = session
        .sequencer
        .advance(Phase::Proposal, Phase::Accepted, || None)
        .await?;
    if !advanced {
        // Lost a race with another accept; same outcome
        return Ok(());
    }

    let db = session.db.clone();
    let slug = session.journey.slug.clone();
    tokio::spawn(async move {
        if let Err(e) = db::journeys::mark_accepted(&db, &slug).await {
            error!("Failed to persist acceptance for '{}': {}", slug, e);
        }
    });

    session.state.broadcast_event(ViewerEvent::Celebration {
        partner_name: session.journey.partner_name.clone(),
        proposer_name: session.journey.proposer_name.clone(),
        timestamp: Utc::now(),
    });
    Ok(())
}

/// Dodge the decline control to a new random viewport position
///
/// Purely presentational: the phase is untouched and nothing is persisted.
pub async fn decline(session: &ViewerSession, viewport: Viewport) -> Result<DeclinePosition> {
    let phase = session.state.get_phase().await;
    if phase != Phase::Proposal {
        return Err(Error::InvalidState(format!(
            "cannot decline during {} phase",
            phase
        )));
    }

    let position = dodge_position(viewport);
    session.state.broadcast_event(ViewerEvent::DeclineDodged {
        x: position.x,
        y: position.y,
        timestamp: Utc::now(),
    });
    Ok(position)
}

/// Pick a random position that keeps the control fully inside the viewport
pub fn dodge_position(viewport: Viewport) -> DeclinePosition {
    let mut rng = rand::thread_rng();
    let x_range = (viewport.width - CONTROL_WIDTH).max(0.0);
    let y_range = (viewport.height - CONTROL_HEIGHT).max(0.0);
    DeclinePosition {
        x: rng.gen::<f64>() * x_range,
        y: rng.gen::<f64>() * y_range,
    }
}
