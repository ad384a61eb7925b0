//! Journey record access
//!
//! The viewer reads one record by slug per session and performs exactly one
//! kind of write: flipping the acceptance flag to true. The flag is
//! monotonic; there is no code path that resets it.

use crate::error::{Error, Result};
use keepsake_common::journey::{JourneyRecord, LoveReason, MediaItem};
use sqlx::{Pool, Sqlite};
use tracing::warn;

/// Row shape for the journeys table; JSON columns stay as text here
type JourneyRow = (
    String,         // slug
    String,         // partner_name
    String,         // proposer_name
    String,         // passcode
    String,         // media (JSON)
    String,         // photos (JSON)
    Option<String>, // music_url
    Option<String>, // how_we_met_text
    String,         // love_reasons (JSON)
    bool,           // is_accepted
);

/// Fetch one journey by slug
pub async fn get_journey(db: &Pool<Sqlite>, slug: &str) -> Result<Option<JourneyRecord>> {
    let row = sqlx::query_as::<_, JourneyRow>(
        r#"
        SELECT slug, partner_name, proposer_name, passcode,
               media, photos, music_url, how_we_met_text,
               love_reasons, is_accepted
        FROM journeys
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(db)
    .await?;

    Ok(row.map(record_from_row))
}

/// Mark a journey accepted
///
/// Idempotent: repeating the update on an already-accepted record succeeds
/// and changes nothing visible.
pub async fn mark_accepted(db: &Pool<Sqlite>, slug: &str) -> Result<()> {
    let result = sqlx::query("UPDATE journeys SET is_accepted = 1 WHERE slug = ?")
        .bind(slug)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("journey '{}'", slug)));
    }
    Ok(())
}

/// Insert a journey record (authoring side / test seeding)
pub async fn insert_journey(db: &Pool<Sqlite>, record: &JourneyRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO journeys
            (slug, partner_name, proposer_name, passcode,
             media, photos, music_url, how_we_met_text,
             love_reasons, is_accepted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.slug)
    .bind(&record.partner_name)
    .bind(&record.proposer_name)
    .bind(&record.passcode)
    .bind(serde_json::to_string(&record.media).unwrap_or_else(|_| "[]".to_string()))
    .bind(serde_json::to_string(&record.photos).unwrap_or_else(|_| "[]".to_string()))
    .bind(&record.music_url)
    .bind(&record.how_we_met_text)
    .bind(serde_json::to_string(&record.love_reasons).unwrap_or_else(|_| "[]".to_string()))
    .bind(record.is_accepted)
    .execute(db)
    .await?;

    Ok(())
}

/// Convert a raw row to a record; malformed JSON columns degrade to empty
/// lists rather than failing the session
fn record_from_row(row: JourneyRow) -> JourneyRecord {
    let (
        slug,
        partner_name,
        proposer_name,
        passcode,
        media_json,
        photos_json,
        music_url,
        how_we_met_text,
        reasons_json,
        is_accepted,
    ) = row;

    let media: Vec<MediaItem> = parse_json_column(&slug, "media", &media_json);
    let photos: Vec<String> = parse_json_column(&slug, "photos", &photos_json);
    let love_reasons: Vec<LoveReason> = parse_json_column(&slug, "love_reasons", &reasons_json);

    JourneyRecord {
        slug,
        partner_name,
        proposer_name,
        passcode,
        media,
        photos,
        music_url,
        how_we_met_text,
        love_reasons,
        is_accepted,
    }
}

fn parse_json_column<T: serde::de::DeserializeOwned + Default>(
    slug: &str,
    column: &str,
    json: &str,
) -> T {
    match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            warn!("Malformed {} column on journey '{}': {}", column, slug, e);
            T::default()
        }
    }
}
