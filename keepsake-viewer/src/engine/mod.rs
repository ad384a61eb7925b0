//! Viewer engine
//!
//! Coordinates sessions, the phase sequencer, preloading, sub-players, and
//! the decision handler. One `ViewerSession` exists per recipient visit;
//! the `ViewerEngine` is the process-wide registry that creates and prunes
//! them.

pub mod audio;
pub mod decision;
pub mod gallery;
pub mod gate;
pub mod preloader;
pub mod reasons;
pub mod sequencer;
pub mod story;
pub mod timer;

use crate::db;
use crate::error::{Error, Result};
use crate::state::SessionState;
use crate::timing::Timing;
use audio::AudioController;
use keepsake_common::api::{
    DeclinePosition, SessionSnapshot, UnlockRequest, UnlockResponse, Viewport,
};
use keepsake_common::journey::{AssetRef, JourneyView, LoveReason, MediaItem};
use keepsake_common::phase::Phase;
use preloader::{AssetFetcher, HttpFetcher, Preloader};
use sequencer::Sequencer;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use timer::TaskGuard;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, sleep};
use tracing::{debug, error, info};
use uuid::Uuid;

/// One recipient's viewing session
///
/// Owns the normalized journey view, the phase state machine, and every
/// timer driving the experience. Driver tasks hold only weak references
/// back to the session so an abandoned session can actually drop.
pub struct ViewerSession {
    pub id: Uuid,
    pub journey: JourneyView,
    pub state: Arc<SessionState>,
    pub(crate) timing: Timing,
    pub(crate) db: Pool<Sqlite>,
    pub(crate) sequencer: Sequencer,
    pub(crate) audio: AudioController,
    /// Self-reference handed to driver tasks
    weak: Weak<ViewerSession>,
    /// Sender for client video-ended signals, live during the gallery phase
    video_ended_tx: StdMutex<Option<mpsc::UnboundedSender<usize>>>,
    fetcher: Arc<dyn AssetFetcher>,
}

impl ViewerSession {
    fn new(
        journey: JourneyView,
        timing: Timing,
        db: Pool<Sqlite>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Arc<Self> {
        let state = Arc::new(SessionState::new());
        let sequencer = Sequencer::new(Arc::clone(&state));
        Arc::new_cyclic(|weak| Self {
            id: Uuid::new_v4(),
            journey,
            state,
            timing,
            db,
            sequencer,
            audio: AudioController::new(),
            weak: weak.clone(),
            video_ended_tx: StdMutex::new(None),
            fetcher,
        })
    }

    /// Begin the loading phase (preload driver)
    async fn start(&self) {
        let guard = TaskGuard::spawn(Self::run_loading(
            self.weak.clone(),
            Arc::clone(&self.fetcher),
            self.timing.preload_ceiling,
            self.journey.assets(),
            Arc::clone(&self.state),
        ));
        self.sequencer.install_driver(guard).await;
    }

    async fn run_loading(
        session: Weak<ViewerSession>,
        fetcher: Arc<dyn AssetFetcher>,
        ceiling: Duration,
        assets: Vec<AssetRef>,
        state: Arc<SessionState>,
    ) {
        let outcome = Preloader::new(fetcher, ceiling).run(assets, &state).await;

        let Some(session) = session.upgrade() else { return };
        if let Some(handle) = outcome.audio {
            session.audio.set_handle(handle).await;
        }
        if let Err(e) = session
            .sequencer
            .advance(Phase::Loading, Phase::Splash, || None)
            .await
        {
            error!("Failed to leave loading phase: {}", e);
        }
    }

    /// Submit a passcode at the gate
    ///
    /// A match unlocks (splash -> hero) and opportunistically starts the
    /// music, this being the first user gesture. A mismatch records a
    /// user-facing error; the previous error clears on every new attempt.
    pub async fn unlock(&self, request: &UnlockRequest) -> Result<UnlockResponse> {
        let phase = self.state.get_phase().await;
        if phase != Phase::Splash {
            // Loading still in progress, or already unlocked
            return Ok(UnlockResponse {
                unlocked: phase.is_unlocked(),
                error: None,
            });
        }

        if !gate::passcode_matches(&request.passcode, &self.journey.passcode) {
            self.state
                .set_unlock_error(Some(gate::UNLOCK_ERROR.to_string()))
                .await;
            return Ok(UnlockResponse {
                unlocked: false,
                error: Some(gate::UNLOCK_ERROR.to_string()),
            });
        }

        self.state.set_unlock_error(None).await;

        let weak = self.weak.clone();
        let dwell = self.timing.hero_dwell;
        self.sequencer
            .advance(Phase::Splash, Phase::Hero, move || {
                Some(TaskGuard::spawn(Self::run_hero(weak, dwell)))
            })
            .await?;

        // First user gesture: platforms allow playback started here
        self.audio.try_autoplay(&self.state).await;

        Ok(UnlockResponse {
            unlocked: true,
            error: None,
        })
    }

    async fn run_hero(session: Weak<ViewerSession>, dwell: Duration) {
        sleep(dwell).await;
        let Some(session) = session.upgrade() else { return };
        session.enter_gallery().await;
    }

    async fn enter_gallery(&self) {
        let weak = self.weak.clone();
        let items = self.journey.gallery.clone();
        let timing = self.timing.clone();
        let state = Arc::clone(&self.state);

        let result = self
            .sequencer
            .advance(Phase::Hero, Phase::Gallery, || {
                let (tx, rx) = mpsc::unbounded_channel();
                *self.video_ended_tx.lock().expect("video sender lock") = Some(tx);
                Some(TaskGuard::spawn(Self::run_gallery(
                    weak, items, timing, state, rx,
                )))
            })
            .await;
        if let Err(e) = result {
            error!("Failed to enter gallery phase: {}", e);
        }
    }

    async fn run_gallery(
        session: Weak<ViewerSession>,
        items: Vec<MediaItem>,
        timing: Timing,
        state: Arc<SessionState>,
        video_ended: mpsc::UnboundedReceiver<usize>,
    ) {
        gallery::run(&items, &timing, &state, video_ended).await;
        let Some(session) = session.upgrade() else { return };
        session.enter_story().await;
    }

    async fn enter_story(&self) {
        // The gallery is done with its signal channel
        self.video_ended_tx.lock().expect("video sender lock").take();

        let weak = self.weak.clone();
        let paragraphs = self.journey.story_paragraphs.clone();
        let timing = self.timing.clone();
        let state = Arc::clone(&self.state);

        let result = self
            .sequencer
            .advance(Phase::Gallery, Phase::Story, move || {
                Some(TaskGuard::spawn(Self::run_story(
                    weak, paragraphs, timing, state,
                )))
            })
            .await;
        if let Err(e) = result {
            error!("Failed to enter story phase: {}", e);
        }
    }

    async fn run_story(
        session: Weak<ViewerSession>,
        paragraphs: Vec<String>,
        timing: Timing,
        state: Arc<SessionState>,
    ) {
        story::run(&paragraphs, &timing, &state).await;
        let Some(session) = session.upgrade() else { return };
        session.enter_reasons().await;
    }

    async fn enter_reasons(&self) {
        let weak = self.weak.clone();
        let reasons = self.journey.reasons.clone();
        let timing = self.timing.clone();
        let state = Arc::clone(&self.state);

        let result = self
            .sequencer
            .advance(Phase::Story, Phase::Reasons, move || {
                Some(TaskGuard::spawn(Self::run_reasons(
                    weak, reasons, timing, state,
                )))
            })
            .await;
        if let Err(e) = result {
            error!("Failed to enter reasons phase: {}", e);
        }
    }

    async fn run_reasons(
        session: Weak<ViewerSession>,
        reasons: Vec<LoveReason>,
        timing: Timing,
        state: Arc<SessionState>,
    ) {
        reasons::run(&reasons, &timing, &state).await;
        let Some(session) = session.upgrade() else { return };
        if let Err(e) = session
            .sequencer
            .advance(Phase::Reasons, Phase::Proposal, || None)
            .await
        {
            error!("Failed to enter proposal phase: {}", e);
        }
    }

    /// Accept the proposal (terminal)
    pub async fn accept(&self) -> Result<()> {
        decision::accept(self).await
    }

    /// Dodge the decline control
    pub async fn decline(&self, viewport: Viewport) -> Result<DeclinePosition> {
        decision::decline(self, viewport).await
    }

    /// Client reports a gallery video finished playing
    pub fn video_ended(&self, index: usize) {
        let sender = self.video_ended_tx.lock().expect("video sender lock");
        if let Some(tx) = sender.as_ref() {
            // Receiver may have just closed on phase exit; that's fine
            let _ = tx.send(index);
        }
    }

    /// Toggle background music
    pub async fn music_toggle(&self) -> bool {
        self.audio.toggle(&self.state).await
    }

    /// Client reports the platform blocked playback
    pub async fn music_blocked(&self) {
        self.audio.mark_blocked(&self.state).await
    }

    /// Public state snapshot (never includes the passcode)
    pub async fn snapshot(&self) -> SessionSnapshot {
        let phase = self.state.get_phase().await;
        SessionSnapshot {
            session_id: self.id,
            phase,
            locked: !phase.is_unlocked(),
            partner_name: self.journey.partner_name.clone(),
            proposer_name: self.journey.proposer_name.clone(),
            preload_percent: self.state.get_preload().await.percent(),
            gallery_count: self.journey.gallery.len(),
            reason_count: self.journey.reasons.len(),
            gallery_index: *self.state.gallery_index.read().await,
            story_percent: *self.state.story_percent.read().await,
            reason_index: *self.state.reason_index.read().await,
            music_available: self.audio.is_available().await,
            music_playing: self.audio.is_playing().await,
            unlock_error: self.state.get_unlock_error().await,
            accepted: phase == Phase::Accepted || self.journey.is_accepted,
        }
    }
}

/// Process-wide session registry
pub struct ViewerEngine {
    db: Pool<Sqlite>,
    timing: Timing,
    fetcher: Arc<dyn AssetFetcher>,
    sessions: RwLock<HashMap<Uuid, Arc<ViewerSession>>>,
}

impl ViewerEngine {
    /// Create an engine with the default HTTP fetcher
    pub fn new(db: Pool<Sqlite>, timing: Timing) -> Arc<Self> {
        Self::with_fetcher(db, timing, Arc::new(HttpFetcher::new()))
    }

    /// Create an engine with a custom asset fetcher (tests)
    pub fn with_fetcher(
        db: Pool<Sqlite>,
        timing: Timing,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            timing,
            fetcher,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Fetch the journey by slug and start a new viewing session
    pub async fn create_session(&self, slug: &str) -> Result<Arc<ViewerSession>> {
        let record = db::journeys::get_journey(&self.db, slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("journey '{}'", slug)))?;
        let journey = JourneyView::from_record(record);

        let session = ViewerSession::new(
            journey,
            self.timing.clone(),
            self.db.clone(),
            Arc::clone(&self.fetcher),
        );
        session.start().await;

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, Arc::clone(&session));
        info!(
            "Session {} started for '{}' ({} active)",
            session.id,
            slug,
            sessions.len()
        );
        Ok(session)
    }

    /// Look up an active session
    pub async fn session(&self, id: Uuid) -> Result<Arc<ViewerSession>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Background loop dropping sessions idle past the configured window
    pub fn spawn_prune_loop(self: Arc<Self>) {
        let engine = self;
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                engine.prune_idle_sessions().await;
            }
        });
    }

    async fn prune_idle_sessions(&self) {
        let idle_window = self.timing.session_idle;
        let mut expired = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                if session.state.idle_for().await > idle_window {
                    expired.push(*id);
                }
            }
        }
        if expired.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().await;
        for id in &expired {
            sessions.remove(id);
        }
        debug!("Pruned {} idle sessions ({} active)", expired.len(), sessions.len());
    }
}
