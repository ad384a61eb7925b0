//! Asset preloader
//!
//! Warms every referenced asset concurrently before the splash screen is
//! shown: images are fetched fully, video and audio only to metadata (a
//! recipient who never unlocks should not cost full video bandwidth).
//! Progress counts failures as completions so one unreachable asset can
//! never stall the loading screen, and a ceiling timeout forces resolution
//! under degraded networks. Resolution happens exactly once.

use crate::engine::audio::AudioHandle;
use crate::error::Result;
use crate::state::SessionState;
use chrono::Utc;
use futures::future::BoxFuture;
use keepsake_common::events::ViewerEvent;
use keepsake_common::journey::{AssetKind, AssetRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Asset counts above this log a warning; the ceiling timeout is the only
/// other mitigation for oversized journeys
const ASSET_COUNT_WARN: usize = 100;

/// Metadata captured for a warmed asset
#[derive(Debug, Clone, Default)]
pub struct AssetMeta {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Per-asset fetch policy, behind a trait so tests can run without a
/// network
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, asset: AssetRef) -> BoxFuture<'static, Result<AssetMeta>>;
}

/// reqwest-backed fetcher: full GET for images, HEAD for video/audio
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, asset: AssetRef) -> BoxFuture<'static, Result<AssetMeta>> {
        let client = self.client.clone();
        Box::pin(async move {
            let response = match asset.kind {
                // Images are displayed from cache immediately; pull the bytes
                AssetKind::Image => client.get(&asset.url).send().await?.error_for_status()?,
                // Metadata only; the browser streams the body at display time
                AssetKind::Video | AssetKind::Audio => {
                    client.head(&asset.url).send().await?.error_for_status()?
                }
            };

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let content_length = response.content_length();

            if asset.kind == AssetKind::Image {
                // Drain the body so the bytes are actually transferred
                let _ = response.bytes().await?;
            }

            Ok(AssetMeta {
                content_type,
                content_length,
            })
        })
    }
}

/// Outcome of one preload run
#[derive(Debug)]
pub struct PreloadOutcome {
    pub loaded: usize,
    pub failed: usize,
    pub total: usize,
    pub timed_out: bool,
    /// Resolved background music handle, if the music asset loaded
    pub audio: Option<AudioHandle>,
}

/// Concurrent asset warm-up with monotone progress and a ceiling timeout
pub struct Preloader {
    fetcher: Arc<dyn AssetFetcher>,
    ceiling: Duration,
}

impl Preloader {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, ceiling: Duration) -> Self {
        Self { fetcher, ceiling }
    }

    /// Load all assets; returns when every asset has completed (success or
    /// failure) or when the ceiling elapses, whichever is first
    pub async fn run(&self, assets: Vec<AssetRef>, state: &SessionState) -> PreloadOutcome {
        let total = assets.len();
        {
            let mut preload = state.preload.write().await;
            preload.total = total;
        }

        if total == 0 {
            return self.resolve(state, 0, 0, 0, false, None).await;
        }
        if total > ASSET_COUNT_WARN {
            warn!("Preloading {} assets; expect the ceiling timeout to govern", total);
        }

        let mut set = JoinSet::new();
        for asset in assets {
            let fetcher = Arc::clone(&self.fetcher);
            set.spawn(async move {
                let kind = asset.kind;
                let url = asset.url.clone();
                (kind, url, fetcher.fetch(asset).await)
            });
        }

        let deadline = sleep(self.ceiling);
        tokio::pin!(deadline);

        let mut loaded = 0usize;
        let mut failed = 0usize;
        let mut timed_out = false;
        let mut audio: Option<AudioHandle> = None;

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!(
                        "Preload ceiling reached with {}/{} assets outstanding",
                        total - loaded - failed,
                        total
                    );
                    timed_out = true;
                    set.abort_all();
                    break;
                }
                joined = set.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok((kind, url, Ok(meta))) => {
                            loaded += 1;
                            if kind == AssetKind::Audio && audio.is_none() {
                                audio = Some(AudioHandle {
                                    url,
                                    content_type: meta.content_type.clone(),
                                    looped: true,
                                });
                            }
                        }
                        Ok((_, url, Err(e))) => {
                            failed += 1;
                            debug!("Asset failed to load ({}): {}", url, e);
                        }
                        Err(e) => {
                            failed += 1;
                            debug!("Asset load task failed: {}", e);
                        }
                    }

                    {
                        let mut preload = state.preload.write().await;
                        preload.loaded = loaded;
                        preload.failed = failed;
                    }
                    state.broadcast_event(ViewerEvent::PreloadProgress {
                        loaded,
                        failed,
                        total,
                        percent: state.get_preload().await.percent(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }

        self.resolve(state, loaded, failed, total, timed_out, audio)
            .await
    }

    async fn resolve(
        &self,
        state: &SessionState,
        loaded: usize,
        failed: usize,
        total: usize,
        timed_out: bool,
        audio: Option<AudioHandle>,
    ) -> PreloadOutcome {
        {
            let mut preload = state.preload.write().await;
            preload.loaded = loaded;
            preload.failed = failed;
            preload.total = total;
            preload.resolved = true;
        }
        state.broadcast_event(ViewerEvent::PreloadResolved {
            loaded,
            failed,
            total,
            timed_out,
            timestamp: Utc::now(),
        });
        debug!(
            "Preload resolved: {}/{} loaded, {} failed, timed_out={}",
            loaded, total, failed, timed_out
        );

        PreloadOutcome {
            loaded,
            failed,
            total,
            timed_out,
            audio,
        }
    }
}
