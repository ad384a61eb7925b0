//! Gallery sub-player
//!
//! Walks the gallery media slice with a strictly sequential cursor: images
//! dwell for a fixed duration, videos hold until the client reports
//! playback ended or a safety ceiling elapses. The per-item timer lives in
//! this task's current await, so advancing the cursor structurally replaces
//! the previous item's timer; two items' timers can never run at once. An
//! empty slice completes immediately.

use crate::state::SessionState;
use crate::timing::Timing;
use chrono::Utc;
use keepsake_common::events::ViewerEvent;
use keepsake_common::journey::{MediaItem, MediaKind};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::debug;

/// Run the gallery sequence to exhaustion; returns exactly once
pub async fn run(
    items: &[MediaItem],
    timing: &Timing,
    state: &SessionState,
    mut video_ended: mpsc::UnboundedReceiver<usize>,
) {
    for (index, item) in items.iter().enumerate() {
        state.set_gallery_index(Some(index)).await;
        state.broadcast_event(ViewerEvent::GalleryItemShown {
            index,
            kind: item.kind,
            timestamp: Utc::now(),
        });

        match item.kind {
            MediaKind::Image => sleep(timing.gallery_image_dwell).await,
            MediaKind::Video => {
                wait_for_video(index, timing, &mut video_ended).await;
            }
        }
    }

    debug!("Gallery exhausted after {} items", items.len());
    state.broadcast_event(ViewerEvent::GalleryCompleted {
        timestamp: Utc::now(),
    });
}

/// Hold on a video item until its ended signal or the ceiling, whichever
/// comes first
async fn wait_for_video(
    index: usize,
    timing: &Timing,
    video_ended: &mut mpsc::UnboundedReceiver<usize>,
) {
    let ceiling = sleep(timing.gallery_video_ceiling);
    tokio::pin!(ceiling);

    loop {
        tokio::select! {
            _ = &mut ceiling => {
                debug!("Video {} hit the {}s ceiling", index, timing.gallery_video_ceiling.as_secs());
                return;
            }
            signal = video_ended.recv() => {
                match signal {
                    Some(i) if i == index => return,
                    // Stale signal from an item the cursor already left
                    Some(i) => debug!("Ignoring ended signal for video {} (showing {})", i, index),
                    // Sender gone; the ceiling still bounds the dwell
                    None => {
                        ceiling.await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_common::journey::MediaSection;
    use std::time::Duration;
    use tokio::time::Instant;

    fn image(url: &str) -> MediaItem {
        MediaItem {
            kind: MediaKind::Image,
            url: url.to_string(),
            caption: None,
            section: MediaSection::Gallery,
        }
    }

    fn video(url: &str) -> MediaItem {
        MediaItem {
            kind: MediaKind::Video,
            url: url.to_string(),
            caption: None,
            section: MediaSection::Gallery,
        }
    }

    fn channel() -> (mpsc::UnboundedSender<usize>, mpsc::UnboundedReceiver<usize>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test(start_paused = true)]
    async fn empty_gallery_completes_immediately() {
        let state = SessionState::new();
        let mut rx = state.subscribe_events();
        let (_tx, ended) = channel();

        run(&[], &Timing::default(), &state, ended).await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            ViewerEvent::GalleryCompleted { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn images_dwell_in_order_then_complete_once() {
        let state = SessionState::new();
        let mut rx = state.subscribe_events();
        let (_tx, ended) = channel();
        let items = [image("a.jpg"), image("b.jpg"), image("c.jpg")];

        let started = Instant::now();
        run(&items, &Timing::default(), &state, ended).await;
        assert_eq!(started.elapsed(), Duration::from_secs(15));

        let mut shown = Vec::new();
        let mut completed = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                ViewerEvent::GalleryItemShown { index, .. } => shown.push(index),
                ViewerEvent::GalleryCompleted { .. } => completed += 1,
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert_eq!(shown, vec![0, 1, 2]);
        assert_eq!(completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn video_ends_on_client_signal() {
        let state = SessionState::new();
        let (tx, ended) = channel();
        let items = [video("clip.mp4"), image("a.jpg")];
        let timing = Timing::default();

        let started = Instant::now();
        let gallery = run(&items, &timing, &state, ended);
        tokio::pin!(gallery);

        // Signal the video ended after 7 simulated seconds
        tokio::select! {
            _ = &mut gallery => panic!("gallery finished early"),
            _ = tokio::time::sleep(Duration::from_secs(7)) => {
                tx.send(0).unwrap();
            }
        }
        gallery.await;

        // 7s of video + 5s image dwell, far below the 120s ceiling
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn video_falls_back_to_ceiling() {
        let state = SessionState::new();
        let (_tx, ended) = channel();
        let items = [video("clip.mp4")];
        let timing = Timing::default();

        let started = Instant::now();
        run(&items, &timing, &state, ended).await;
        assert_eq!(started.elapsed(), timing.gallery_video_ceiling);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_video_signal_is_ignored() {
        let state = SessionState::new();
        let (tx, ended) = channel();
        let items = [video("a.mp4"), video("b.mp4")];
        let timing = Timing::default();

        // A stray signal for an index the cursor is not on
        tx.send(5).unwrap();
        tx.send(0).unwrap();

        let started = Instant::now();
        let gallery = run(&items, &timing, &state, ended);
        tokio::pin!(gallery);

        tokio::select! {
            _ = &mut gallery => panic!("gallery finished early"),
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                tx.send(1).unwrap();
            }
        }
        gallery.await;

        // First video ended on its own signal, second on the late one
        assert!(started.elapsed() < timing.gallery_video_ceiling);
    }
}
