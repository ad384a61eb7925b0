//! Journey record types and the normalized view model
//!
//! The raw record is whatever the authoring side stored: it may carry the
//! newer `media` list or only the legacy `photos` URL list, and its text
//! fields may be blank. `JourneyView::from_record` applies every derivation
//! rule exactly once per session so the sub-players never re-derive
//! anything ad hoc:
//! - legacy `photos` are wrapped into gallery image items when `media` is empty
//! - a love reason's media kind is sniffed from its URL extension
//! - missing how-we-met text and empty reason lists fall back to defaults

use serde::{Deserialize, Serialize};

/// Kind of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Which sub-player consumes a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaSection {
    #[default]
    Gallery,
    HowWeMet,
    Love,
}

/// One media entry of a journey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub section: MediaSection,
}

/// One love reason, optionally illustrated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoveReason {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl LoveReason {
    /// Media kind derived from the URL's file extension
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media_url.as_deref().map(sniff_media_kind)
    }
}

/// Derive a media kind from a URL's file extension
///
/// `.mp4`, `.webm`, and `.mov` are video; everything else is treated as an
/// image. Query strings and fragments are ignored.
pub fn sniff_media_kind(url: &str) -> MediaKind {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();
    if path.ends_with(".mp4") || path.ends_with(".webm") || path.ends_with(".mov") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Raw journey record as stored
///
/// Read-only to the viewer except for `is_accepted`, which is flipped
/// false -> true at most once by the decision handler.
#[derive(Debug, Clone)]
pub struct JourneyRecord {
    pub slug: String,
    pub partner_name: String,
    pub proposer_name: String,
    pub passcode: String,
    pub media: Vec<MediaItem>,
    /// Legacy URL list, used only when `media` is empty
    pub photos: Vec<String>,
    pub music_url: Option<String>,
    pub how_we_met_text: Option<String>,
    pub love_reasons: Vec<LoveReason>,
    pub is_accepted: bool,
}

/// Kind of a preloadable asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
    Audio,
}

impl From<MediaKind> for AssetKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => AssetKind::Image,
            MediaKind::Video => AssetKind::Video,
        }
    }
}

/// One asset reference handed to the preloader
#[derive(Debug, Clone)]
pub struct AssetRef {
    pub url: String,
    pub kind: AssetKind,
}

/// Normalized journey view consumed by the session engine
///
/// Computed once per view session. The passcode is kept only for the local
/// gate comparison; this type is deliberately not serializable so it can
/// never leak through an API response or event.
#[derive(Debug, Clone)]
pub struct JourneyView {
    pub slug: String,
    pub partner_name: String,
    pub proposer_name: String,
    pub passcode: String,
    /// Full normalized media list (legacy photos already wrapped)
    pub media: Vec<MediaItem>,
    /// Gallery slice of `media`
    pub gallery: Vec<MediaItem>,
    /// Featured how-we-met item: first tagged `HowWeMet`, else first overall
    pub featured: Option<MediaItem>,
    /// How-we-met text split into paragraphs, defaulted when blank
    pub story_paragraphs: Vec<String>,
    /// Love reasons, defaulted when empty
    pub reasons: Vec<LoveReason>,
    pub music_url: Option<String>,
    pub is_accepted: bool,
}

impl JourneyView {
    /// Normalize a raw record into the view model
    pub fn from_record(record: JourneyRecord) -> Self {
        let media = if record.media.is_empty() {
            record
                .photos
                .iter()
                .map(|url| MediaItem {
                    kind: MediaKind::Image,
                    url: url.clone(),
                    caption: None,
                    section: MediaSection::Gallery,
                })
                .collect()
        } else {
            record.media
        };

        let gallery: Vec<MediaItem> = media
            .iter()
            .filter(|item| item.section == MediaSection::Gallery)
            .cloned()
            .collect();

        let featured = media
            .iter()
            .find(|item| item.section == MediaSection::HowWeMet)
            .or_else(|| media.first())
            .cloned();

        let story_text = record
            .how_we_met_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_story_text(&record.partner_name, &record.proposer_name));

        let story_paragraphs = story_text
            .split("\n\n")
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(str::to_string)
            .collect();

        let reasons = if record.love_reasons.is_empty() {
            default_reasons()
        } else {
            record.love_reasons
        };

        Self {
            slug: record.slug,
            partner_name: record.partner_name,
            proposer_name: record.proposer_name,
            passcode: record.passcode,
            media,
            gallery,
            featured,
            story_paragraphs,
            reasons,
            music_url: record.music_url,
            is_accepted: record.is_accepted,
        }
    }

    /// Every asset the preloader should warm: all media items, all reason
    /// illustrations, and the background music if present
    pub fn assets(&self) -> Vec<AssetRef> {
        let mut assets: Vec<AssetRef> = self
            .media
            .iter()
            .map(|item| AssetRef {
                url: item.url.clone(),
                kind: item.kind.into(),
            })
            .collect();

        for reason in &self.reasons {
            if let Some(url) = &reason.media_url {
                assets.push(AssetRef {
                    url: url.clone(),
                    kind: sniff_media_kind(url).into(),
                });
            }
        }

        if let Some(url) = &self.music_url {
            assets.push(AssetRef {
                url: url.clone(),
                kind: AssetKind::Audio,
            });
        }

        assets
    }
}

/// Templated how-we-met text used when the proposer wrote none
fn default_story_text(partner_name: &str, proposer_name: &str) -> String {
    format!(
        "{partner_name}, some stories are too big for words.\n\n\
         Ours started quietly, the way the best ones do, and it has been \
         growing ever since.\n\n\
         Every day since then, {proposer_name} has been collecting moments \
         like these, waiting for the right one to ask you something."
    )
}

/// Default set of five generic reasons used when the proposer listed none
fn default_reasons() -> Vec<LoveReason> {
    [
        "The way you laugh at the worst jokes",
        "How home is wherever you are",
        "You make the ordinary days the best ones",
        "The way you believe in me before I do",
        "Every plan is better with you in it",
    ]
    .into_iter()
    .map(|text| LoveReason {
        text: text.to_string(),
        media_url: None,
    })
    .collect()
}
