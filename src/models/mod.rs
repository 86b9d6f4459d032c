//! Domain models for the catalog mirror
//!
//! These are the application-facing shapes; the SeaORM persistence models
//! live in `crate::entities` and are converted at the repository boundary.
//! Surrogate ids are locally assigned `i64` keys and carry no provider
//! meaning; provider identity travels in the `external_*` fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Catalog sections exposed by an Xtream provider
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CatalogSection {
    Live,
    Vod,
    Series,
}

impl CatalogSection {
    /// Provider API action listing this section's categories
    pub fn categories_action(&self) -> &'static str {
        match self {
            CatalogSection::Live => "get_live_categories",
            CatalogSection::Vod => "get_vod_categories",
            CatalogSection::Series => "get_series_categories",
        }
    }

    /// Provider API action listing this section's streams
    pub fn streams_action(&self) -> &'static str {
        match self {
            CatalogSection::Live => "get_live_streams",
            CatalogSection::Vod => "get_vod_streams",
            CatalogSection::Series => "get_series",
        }
    }
}

/// How a playlist's content is sourced
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Flat M3U playlist URL
    M3u,
    /// Xtream Codes provider API
    Xtream,
}

/// A provider account / playlist owning part of the local catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub source_url: String,
    pub kind: SourceKind,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// A provider category within one section of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub playlist_id: i64,
    pub external_id: String,
    pub name: String,
    pub section: CatalogSection,
}

/// Record shape for category upserts (natural key: playlist + section + external id)
#[derive(Debug, Clone)]
pub struct CategoryUpsert {
    pub playlist_id: i64,
    pub external_id: String,
    pub name: String,
    pub section: CatalogSection,
}

/// A live channel owned by a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub logo_url: Option<String>,
    pub stream_url: String,
    pub external_stream_id: Option<String>,
    pub epg_channel_key: Option<String>,
}

/// Record shape for channel upserts (natural key: external stream id)
#[derive(Debug, Clone)]
pub struct ChannelUpsert {
    pub category_id: i64,
    pub name: String,
    pub logo_url: Option<String>,
    pub stream_url: String,
    pub external_stream_id: Option<String>,
    pub epg_channel_key: Option<String>,
}

/// A VOD title owned by a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VodTitle {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub logo_url: Option<String>,
    pub stream_url: String,
    pub external_stream_id: Option<String>,
    pub rating: Option<f32>,
    pub release_date: Option<String>,
}

/// Record shape for VOD upserts (natural key: external stream id)
#[derive(Debug, Clone)]
pub struct VodTitleUpsert {
    pub category_id: i64,
    pub name: String,
    pub logo_url: Option<String>,
    pub stream_url: String,
    pub external_stream_id: Option<String>,
    pub rating: Option<f32>,
    pub release_date: Option<String>,
}

/// A program-guide entry owned by a channel
///
/// Entries are not required to be contiguous or non-overlapping; upstream
/// guides routinely violate both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpgProgram {
    pub id: i64,
    pub channel_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Record shape for guide inserts (surrogate-keyed, no natural key)
#[derive(Debug, Clone)]
pub struct EpgProgramInsert {
    pub channel_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// What kind of stream a watch-progress row tracks
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WatchKind {
    Vod,
    SeriesEpisode,
}

/// Playback position for a stream, keyed by the provider stream id
///
/// Deliberately outside the playlist cascade graph: the provider stream id
/// outlives a resync that regenerates surrogate keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProgress {
    pub id: i64,
    pub external_stream_id: String,
    pub kind: WatchKind,
    pub position_ms: i64,
    pub duration_ms: i64,
    pub last_watched_at: DateTime<Utc>,
}

impl WatchProgress {
    /// Percentage complete for the activity-reporting boundary
    pub fn percent_complete(&self) -> f64 {
        crate::activity::percent_complete(self.position_ms, self.duration_ms)
    }
}

/// A channel joined with its guide entries (start-time ascending)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelWithPrograms {
    pub channel: Channel,
    pub programs: Vec<EpgProgram>,
}
