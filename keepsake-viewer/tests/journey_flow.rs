//! Full journey playback tests
//!
//! Runs whole sessions against the engine under paused time: gate, phase
//! ordering, the proposal decision, and the acceptance write-back.

mod helpers;

use helpers::{journey, journey_with, test_engine, wait_for_phase};
use keepsake_common::api::{UnlockRequest, Viewport};
use keepsake_common::events::ViewerEvent;
use keepsake_common::phase::Phase;
use keepsake_viewer::db;
use keepsake_viewer::Error;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn journey_plays_through_to_proposal() {
    let (engine, _pool) = test_engine(&[journey("trip")]).await;
    let session = engine.create_session("trip").await.unwrap();

    wait_for_phase(&session, Phase::Splash).await;
    let mut rx = session.state.subscribe_events();

    let response = session
        .unlock(&UnlockRequest {
            passcode: "  PARIS  ".to_string(),
        })
        .await
        .unwrap();
    assert!(response.unlocked);

    wait_for_phase(&session, Phase::Proposal).await;

    // Phase changes arrive strictly forward
    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ViewerEvent::PhaseChanged { phase, .. } = event {
            phases.push(phase);
        }
    }
    assert_eq!(
        phases,
        vec![
            Phase::Hero,
            Phase::Gallery,
            Phase::Story,
            Phase::Reasons,
            Phase::Proposal
        ]
    );

    let snapshot = session.snapshot().await;
    assert!(!snapshot.locked);
    assert!(!snapshot.accepted);
    assert_eq!(snapshot.gallery_count, 3);
}

#[tokio::test(start_paused = true)]
async fn bare_journey_still_reaches_proposal() {
    // No media, no reasons on the record; defaults fill the narrative in
    let (engine, _pool) = test_engine(&[journey_with("bare", Vec::new(), Vec::new())]).await;
    let session = engine.create_session("bare").await.unwrap();

    wait_for_phase(&session, Phase::Splash).await;
    session
        .unlock(&UnlockRequest {
            passcode: "paris".to_string(),
        })
        .await
        .unwrap();

    wait_for_phase(&session, Phase::Proposal).await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.gallery_count, 0);
    assert!(snapshot.reason_count > 0);
}

#[tokio::test(start_paused = true)]
async fn wrong_passcode_keeps_the_gate_closed() {
    let (engine, _pool) = test_engine(&[journey("trip")]).await;
    let session = engine.create_session("trip").await.unwrap();
    wait_for_phase(&session, Phase::Splash).await;

    let response = session
        .unlock(&UnlockRequest {
            passcode: "london".to_string(),
        })
        .await
        .unwrap();
    assert!(!response.unlocked);
    assert!(response.error.is_some());
    assert_eq!(session.state.get_phase().await, Phase::Splash);

    // A later correct attempt clears the error and unlocks
    let response = session
        .unlock(&UnlockRequest {
            passcode: "paris".to_string(),
        })
        .await
        .unwrap();
    assert!(response.unlocked);
    assert!(session.snapshot().await.unlock_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn accept_is_terminal_and_persists() {
    let (engine, pool) = test_engine(&[journey("trip")]).await;
    let session = engine.create_session("trip").await.unwrap();

    wait_for_phase(&session, Phase::Splash).await;
    session
        .unlock(&UnlockRequest {
            passcode: "paris".to_string(),
        })
        .await
        .unwrap();
    wait_for_phase(&session, Phase::Proposal).await;

    session.accept().await.unwrap();
    assert_eq!(session.state.get_phase().await, Phase::Accepted);

    // Repeating the gesture is a no-op, not an error
    session.accept().await.unwrap();
    assert_eq!(session.state.get_phase().await, Phase::Accepted);

    // The write-back is fire-and-forget; poll for it
    let mut accepted = false;
    for _ in 0..1_000 {
        let record = db::journeys::get_journey(&pool, "trip")
            .await
            .unwrap()
            .unwrap();
        if record.is_accepted {
            accepted = true;
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(accepted, "acceptance never reached the database");
}

#[tokio::test(start_paused = true)]
async fn decline_dodges_within_the_viewport() {
    let (engine, _pool) = test_engine(&[journey("trip")]).await;
    let session = engine.create_session("trip").await.unwrap();

    wait_for_phase(&session, Phase::Splash).await;
    session
        .unlock(&UnlockRequest {
            passcode: "paris".to_string(),
        })
        .await
        .unwrap();
    wait_for_phase(&session, Phase::Proposal).await;

    let viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };
    for _ in 0..25 {
        let position = session.decline(viewport).await.unwrap();
        assert!(position.x >= 0.0 && position.x <= viewport.width);
        assert!(position.y >= 0.0 && position.y <= viewport.height);
    }

    // The journey never ends on a decline
    assert_eq!(session.state.get_phase().await, Phase::Proposal);

    // Once accepted, the dodge control is gone
    session.accept().await.unwrap();
    let err = session.decline(viewport).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test(start_paused = true)]
async fn stale_unlock_after_hero_reports_unlocked() {
    let (engine, _pool) = test_engine(&[journey("trip")]).await;
    let session = engine.create_session("trip").await.unwrap();

    wait_for_phase(&session, Phase::Splash).await;
    session
        .unlock(&UnlockRequest {
            passcode: "paris".to_string(),
        })
        .await
        .unwrap();

    // A retried unlock from a laggy client is answered, not errored
    let response = session
        .unlock(&UnlockRequest {
            passcode: "paris".to_string(),
        })
        .await
        .unwrap();
    assert!(response.unlocked);
    assert!(response.error.is_none());
}
