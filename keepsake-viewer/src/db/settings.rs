//! Settings database access
//!
//! Read/write settings from the settings table (key-value store). Timing
//! parameters live here so a deployment can tune dwell times without a
//! rebuild; missing keys get their defaults written back on first load.

use crate::error::{Error, Result};
use crate::timing::Timing;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// Generic setting getter
///
/// Returns None if the key doesn't exist. Parses the stored string with
/// FromStr.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Malformed value for setting '{}': {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;
    Ok(())
}

/// Read one duration setting in whole seconds, writing the default back
/// when the key is missing
async fn secs_setting(db: &Pool<Sqlite>, key: &str, default: Duration) -> Result<Duration> {
    match get_setting::<u64>(db, key).await? {
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => {
            set_setting(db, key, default.as_secs()).await?;
            Ok(default)
        }
    }
}

/// Read one duration setting in milliseconds, writing the default back
/// when the key is missing
async fn millis_setting(db: &Pool<Sqlite>, key: &str, default: Duration) -> Result<Duration> {
    match get_setting::<u64>(db, key).await? {
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => {
            set_setting(db, key, default.as_millis() as u64).await?;
            Ok(default)
        }
    }
}

/// Load the timing parameters, materializing defaults for missing keys
pub async fn load_timing(db: &Pool<Sqlite>) -> Result<Timing> {
    let defaults = Timing::default();

    let story_words_per_minute = match get_setting::<u32>(db, "story_words_per_minute").await? {
        // A zero pace would make the scroll duration unbounded
        Some(wpm) => wpm.max(1),
        None => {
            set_setting(db, "story_words_per_minute", defaults.story_words_per_minute).await?;
            defaults.story_words_per_minute
        }
    };

    Ok(Timing {
        preload_ceiling: secs_setting(db, "preload_ceiling_secs", defaults.preload_ceiling).await?,
        hero_dwell: secs_setting(db, "hero_dwell_secs", defaults.hero_dwell).await?,
        gallery_image_dwell: secs_setting(db, "gallery_image_secs", defaults.gallery_image_dwell)
            .await?,
        gallery_video_ceiling: secs_setting(
            db,
            "gallery_video_ceiling_secs",
            defaults.gallery_video_ceiling,
        )
        .await?,
        story_words_per_minute,
        story_min: secs_setting(db, "story_min_secs", defaults.story_min).await?,
        story_settle: millis_setting(db, "story_settle_ms", defaults.story_settle).await?,
        reasons_item_dwell: secs_setting(db, "reasons_item_secs", defaults.reasons_item_dwell)
            .await?,
        reasons_settle: millis_setting(db, "reasons_settle_ms", defaults.reasons_settle).await?,
        session_idle: secs_setting(db, "session_idle_prune_secs", defaults.session_idle).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn get_missing_setting_is_none() {
        let db = test_db().await;
        let value: Option<u64> = get_setting(&db, "nothing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let db = test_db().await;
        set_setting(&db, "hero_dwell_secs", 7u64).await.unwrap();
        let value: Option<u64> = get_setting(&db, "hero_dwell_secs").await.unwrap();
        assert_eq!(value, Some(7));
    }

    #[tokio::test]
    async fn malformed_value_is_config_error() {
        let db = test_db().await;
        set_setting(&db, "hero_dwell_secs", "banana").await.unwrap();
        let err = get_setting::<u64>(&db, "hero_dwell_secs").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn load_timing_writes_back_defaults() {
        let db = test_db().await;
        let timing = load_timing(&db).await.unwrap();
        assert_eq!(timing.gallery_image_dwell, Duration::from_secs(5));

        // Defaults were materialized into the table
        let stored: Option<u64> = get_setting(&db, "gallery_image_secs").await.unwrap();
        assert_eq!(stored, Some(5));
    }

    #[tokio::test]
    async fn load_timing_honors_overrides() {
        let db = test_db().await;
        set_setting(&db, "gallery_image_secs", 2u64).await.unwrap();
        set_setting(&db, "story_words_per_minute", 0u32).await.unwrap();

        let timing = load_timing(&db).await.unwrap();
        assert_eq!(timing.gallery_image_dwell, Duration::from_secs(2));
        // Zero pace is clamped up
        assert_eq!(timing.story_words_per_minute, 1);
    }
}
