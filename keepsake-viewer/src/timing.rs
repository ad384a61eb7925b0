//! Viewer timing parameters
//!
//! All phase and sub-player durations in one place, loaded once at startup
//! from the settings table with these defaults written back for missing
//! keys (see `db::settings::load_timing`).

use std::time::Duration;

/// Timing parameters for one viewer engine instance
#[derive(Debug, Clone)]
pub struct Timing {
    /// Ceiling on total preload time; forces resolution regardless of
    /// outstanding fetches
    pub preload_ceiling: Duration,

    /// Dwell on the hero title card before auto-advancing to the gallery
    pub hero_dwell: Duration,

    /// Gallery dwell per image
    pub gallery_image_dwell: Duration,

    /// Safety ceiling on a gallery video when no ended signal arrives
    pub gallery_video_ceiling: Duration,

    /// Reading pace used to size the story scroll duration
    pub story_words_per_minute: u32,

    /// Floor on the story scroll duration
    pub story_min: Duration,

    /// Pause after the story reaches 100% before advancing
    pub story_settle: Duration,

    /// Reasons carousel dwell per item
    pub reasons_item_dwell: Duration,

    /// Pause after the last reason before advancing
    pub reasons_settle: Duration,

    /// Sessions untouched for this long are pruned
    pub session_idle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            preload_ceiling: Duration::from_secs(15),
            hero_dwell: Duration::from_secs(4),
            gallery_image_dwell: Duration::from_secs(5),
            gallery_video_ceiling: Duration::from_secs(120),
            story_words_per_minute: 200,
            story_min: Duration::from_secs(3),
            story_settle: Duration::from_millis(1500),
            reasons_item_dwell: Duration::from_secs(3),
            reasons_settle: Duration::from_millis(1000),
            session_idle: Duration::from_secs(1800),
        }
    }
}
