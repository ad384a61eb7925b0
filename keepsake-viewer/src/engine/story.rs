//! Story (how-we-met) scroller
//!
//! Auto-scrolls the story paragraphs top to bottom over a duration sized
//! from the word count at a fixed reading pace, floored to a minimum.
//! Scroll position is an eased function of elapsed time, emitted on a
//! short tick so clients render a smooth scroll; after reaching 100% the
//! scroller holds for a settle delay before signalling completion.

use crate::state::SessionState;
use crate::timing::Timing;
use chrono::Utc;
use keepsake_common::curves::ease_in_out;
use keepsake_common::events::ViewerEvent;
use std::time::Duration;
use tokio::time::{interval, sleep, Instant};
use tracing::debug;

/// Progress tick period
const TICK: Duration = Duration::from_millis(100);

/// Scroll duration for the given paragraphs at the configured pace
pub fn reading_duration(paragraphs: &[String], timing: &Timing) -> Duration {
    let words: usize = paragraphs
        .iter()
        .map(|paragraph| paragraph.split_whitespace().count())
        .sum();
    let secs = (words as f64) * 60.0 / f64::from(timing.story_words_per_minute);
    Duration::from_secs_f64(secs).max(timing.story_min)
}

/// Run the scroller to completion; returns exactly once
pub async fn run(paragraphs: &[String], timing: &Timing, state: &SessionState) {
    let total = reading_duration(paragraphs, timing);
    debug!(
        "Story scroll over {:.1}s for {} paragraphs",
        total.as_secs_f64(),
        paragraphs.len()
    );

    let started = Instant::now();
    let mut tick = interval(TICK);

    loop {
        tick.tick().await;

        let raw = (started.elapsed().as_secs_f32() / total.as_secs_f32()).min(1.0);
        let percent = if raw >= 1.0 {
            100.0
        } else {
            ease_in_out(raw) * 100.0
        };
        state.set_story_percent(percent).await;
        state.broadcast_event(ViewerEvent::StoryProgress {
            percent,
            timestamp: Utc::now(),
        });

        if raw >= 1.0 {
            break;
        }
    }

    sleep(timing.story_settle).await;
    state.broadcast_event(ViewerEvent::StoryCompleted {
        timestamp: Utc::now(),
    });
}
