//! Shared test fixtures
//!
//! In-memory database seeding and a network-free asset fetcher so whole
//! sessions can run under paused time.

#![allow(dead_code)]

use futures::future::BoxFuture;
use keepsake_common::journey::{AssetRef, JourneyRecord, LoveReason, MediaItem};
use keepsake_common::phase::Phase;
use keepsake_viewer::db;
use keepsake_viewer::engine::preloader::{AssetFetcher, AssetMeta};
use keepsake_viewer::engine::{ViewerEngine, ViewerSession};
use keepsake_viewer::timing::Timing;
use keepsake_viewer::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Fetcher that resolves every asset instantly without touching a network
pub struct StubFetcher;

impl AssetFetcher for StubFetcher {
    fn fetch(&self, _asset: AssetRef) -> BoxFuture<'static, Result<AssetMeta>> {
        Box::pin(async { Ok(AssetMeta::default()) })
    }
}

pub async fn test_db() -> Pool<Sqlite> {
    // Paused test time breaks any pool acquire that has to wait: while the
    // sqlite worker thread answers, the runtime auto-advances straight to
    // sqlx's acquire timeout. So the pool must never park on an acquire.
    // A named shared-cache memory database lets several warm connections
    // share one in-memory database; with spare idle connections, no
    // pre-acquire ping, and no expiry timers, every acquire hits the
    // synchronous fast path. The pool is established on a real-time
    // runtime off the test thread for the same reason.
    static DB_SEQ: AtomicU64 = AtomicU64::new(0);
    let url = format!(
        "sqlite:file:keepsake_test_{}?mode=memory&cache=shared",
        DB_SEQ.fetch_add(1, Ordering::Relaxed)
    );
    tokio::task::spawn_blocking(move || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                const WARM: usize = 8;
                let pool = SqlitePoolOptions::new()
                    .max_connections(WARM as u32)
                    .test_before_acquire(false)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect(&url)
                    .await
                    .unwrap();
                db::init::init_schema(&pool).await.unwrap();
                // Open every connection up front (they also keep the shared
                // memory database alive), then wait for the spawned
                // return-to-pool tasks so dropping this runtime doesn't
                // cancel them.
                let mut conns = Vec::new();
                for _ in 0..WARM {
                    conns.push(pool.acquire().await.unwrap());
                }
                drop(conns);
                while pool.num_idle() < WARM {
                    sleep(Duration::from_millis(1)).await;
                }
                pool
            })
    })
    .await
    .unwrap()
}

/// A journey with three legacy photos, music, and the default story/reasons
pub fn journey(slug: &str) -> JourneyRecord {
    JourneyRecord {
        slug: slug.to_string(),
        partner_name: "Em".to_string(),
        proposer_name: "Jay".to_string(),
        passcode: "paris".to_string(),
        media: Vec::new(),
        photos: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()],
        music_url: Some("https://cdn.example/song.mp3".to_string()),
        how_we_met_text: None,
        love_reasons: Vec::new(),
        is_accepted: false,
    }
}

pub fn journey_with(
    slug: &str,
    media: Vec<MediaItem>,
    love_reasons: Vec<LoveReason>,
) -> JourneyRecord {
    JourneyRecord {
        media,
        love_reasons,
        photos: Vec::new(),
        music_url: None,
        ..journey(slug)
    }
}

/// Engine over an in-memory database seeded with the given journeys
pub async fn test_engine(journeys: &[JourneyRecord]) -> (Arc<ViewerEngine>, Pool<Sqlite>) {
    let pool = test_db().await;
    for record in journeys {
        db::journeys::insert_journey(&pool, record).await.unwrap();
    }
    let engine = ViewerEngine::with_fetcher(pool.clone(), Timing::default(), Arc::new(StubFetcher));
    (engine, pool)
}

/// Poll until the session reaches the given phase; paused time makes this
/// instant in wall-clock terms
pub async fn wait_for_phase(session: &ViewerSession, phase: Phase) {
    for _ in 0..100_000 {
        if session.state.get_phase().await == phase {
            return;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "session never reached {}, stuck in {}",
        phase,
        session.state.get_phase().await
    );
}
