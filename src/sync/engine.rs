//! Catalog synchronization engine
//!
//! Orchestrates one sync run per catalog section: read the selected
//! category scope, fetch each selected category concurrently from the
//! provider, transform records into local entities, and commit them as one
//! upsert batch. Re-running from scratch is always safe: reconciliation is
//! an insert-or-replace keyed by the provider's natural keys, so the run is
//! idempotent by construction.

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::database::repositories::{
    CategoryRepository, ChannelRepository, PlaylistRepository, VodTitleRepository,
};
use crate::models::{
    CatalogSection, CategoryUpsert, ChannelUpsert, SourceKind, VodTitleUpsert,
};
use crate::preferences::{AccountInfo, PreferencesStore};
use crate::sources::{CatalogProvider, ProviderStream};
use crate::sync::progress::{SyncFailure, SyncProgress, SyncStatus};

/// Progress checkpoints: categories reconciled by 0.15, stream fetches span
/// up to 0.8, the store commit closes the rest.
const FRACTION_CATEGORIES_DONE: f32 = 0.15;
const FRACTION_FETCH_SPAN: f32 = 0.65;
const FRACTION_COMMIT: f32 = 0.9;

pub struct SyncEngine {
    provider: Arc<dyn CatalogProvider>,
    preferences: PreferencesStore,
    playlists: PlaylistRepository,
    categories: CategoryRepository,
    channels: ChannelRepository,
    vod_titles: VodTitleRepository,
    progress: SyncProgress,
}

impl SyncEngine {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        preferences: PreferencesStore,
        database: &Database,
    ) -> Self {
        let connection = database.connection();
        let notifier = database.notifier();
        Self {
            provider,
            preferences,
            playlists: PlaylistRepository::new(connection.clone(), notifier.clone()),
            categories: CategoryRepository::new(connection.clone(), notifier.clone()),
            channels: ChannelRepository::new(connection.clone(), notifier.clone()),
            vod_titles: VodTitleRepository::new(connection, notifier),
            progress: SyncProgress::new(),
        }
    }

    /// Observable progress of this engine's runs
    pub fn progress(&self) -> SyncProgress {
        self.progress.clone()
    }

    /// Run one catalog sync for a section.
    ///
    /// Returns (and publishes) the terminal status. Partial per-category
    /// failure is still `Success`; only missing credentials or an error
    /// escaping the whole run produce `Failed`. The progress fraction
    /// reaches 1.0 on every exit path.
    pub async fn sync_catalog(&self, section: CatalogSection, now: DateTime<Utc>) -> SyncStatus {
        info!("Starting {} catalog sync", section);
        self.progress.begin();

        let status = match self.run(section, now).await {
            Ok(()) => SyncStatus::Success,
            Err(failure) => SyncStatus::Failed(failure),
        };

        self.progress.finish(status.clone());
        info!("{} catalog sync finished: {:?}", section, status);
        status
    }

    async fn run(&self, section: CatalogSection, now: DateTime<Utc>) -> Result<(), SyncFailure> {
        let Some(account) = self.preferences.account_info().await else {
            warn!("No stored credentials, aborting {} sync", section);
            return Err(SyncFailure::NotAuthenticated);
        };

        let selected = self.preferences.selected_categories(section).await;
        if selected.is_empty() {
            info!("No {} categories selected, nothing to sync", section);
            return Ok(());
        }

        let playlist = self
            .playlists
            .find_or_create(&account.username, &account.server_url, SourceKind::Xtream)
            .await
            .map_err(internal)?;

        // Categories before streams: every stream row written below must
        // reference an existing category row.
        let listing = match self.provider.categories(&account, section).await {
            Ok(listing) => listing,
            Err(error) => {
                warn!("Failed to list {} categories: {}", section, error);
                Vec::new()
            }
        };
        let names: HashMap<&str, &str> = listing
            .iter()
            .map(|category| (category.external_id.as_str(), category.name.as_str()))
            .collect();
        let category_records = selected
            .iter()
            .map(|external_id| CategoryUpsert {
                playlist_id: playlist.id,
                external_id: external_id.clone(),
                name: names
                    .get(external_id.as_str())
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| external_id.clone()),
                section,
            })
            .collect();
        self.categories
            .upsert_many(category_records)
            .await
            .map_err(internal)?;

        let category_ids: HashMap<String, i64> = self
            .categories
            .by_playlist_section(playlist.id, section)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|category| (category.external_id, category.id))
            .collect();
        self.progress.advance(FRACTION_CATEGORIES_DONE);

        // One task per selected category. Each task is failure-isolated: a
        // failed fetch is logged and contributes nothing, siblings proceed.
        let total = selected.len();
        let mut tasks = FuturesUnordered::new();
        for external_id in selected.iter().cloned() {
            let provider = self.provider.clone();
            let account = account.clone();
            tasks.push(tokio::spawn(async move {
                let streams = provider.streams(&account, section, &external_id).await;
                (external_id, streams)
            }));
        }

        let mut fetched: Vec<(String, Vec<ProviderStream>)> = Vec::new();
        let mut settled = 0usize;
        while let Some(joined) = tasks.next().await {
            settled += 1;
            self.progress.advance(
                FRACTION_CATEGORIES_DONE + FRACTION_FETCH_SPAN * settled as f32 / total as f32,
            );
            match joined {
                Ok((external_id, Ok(streams))) => fetched.push((external_id, streams)),
                Ok((external_id, Err(error))) => {
                    warn!(
                        "Failed to fetch {} streams for category {}: {}",
                        section, external_id, error
                    );
                }
                Err(error) => warn!("Stream fetch task failed: {}", error),
            }
        }

        let mut channel_records: Vec<ChannelUpsert> = Vec::new();
        let mut vod_records: Vec<VodTitleUpsert> = Vec::new();
        let mut seen_stream_ids = HashSet::new();
        let mut missing_key = 0usize;
        let mut duplicates = 0usize;

        for (external_id, streams) in fetched {
            let Some(&category_id) = category_ids.get(&external_id) else {
                continue;
            };
            for stream in streams {
                // The provider stream id is the natural key; without it the
                // record cannot be reconciled and is dropped alone.
                let Some(stream_id) = stream.external_stream_id else {
                    missing_key += 1;
                    continue;
                };
                if !seen_stream_ids.insert(stream_id.clone()) {
                    duplicates += 1;
                    debug!("Skipping duplicate stream id {}", stream_id);
                    continue;
                }

                let name = stream
                    .name
                    .unwrap_or_else(|| format!("Stream {stream_id}"));
                match section {
                    CatalogSection::Live => channel_records.push(ChannelUpsert {
                        category_id,
                        name,
                        logo_url: stream.logo_url,
                        stream_url: live_stream_url(&account, &stream_id),
                        external_stream_id: Some(stream_id),
                        epg_channel_key: stream.epg_channel_key,
                    }),
                    CatalogSection::Vod | CatalogSection::Series => {
                        vod_records.push(VodTitleUpsert {
                            category_id,
                            name,
                            logo_url: stream.logo_url,
                            stream_url: vod_stream_url(
                                &account,
                                section,
                                &stream_id,
                                stream.container_extension.as_deref(),
                            ),
                            external_stream_id: Some(stream_id),
                            rating: stream.rating,
                            release_date: stream.release_date,
                        })
                    }
                }
            }
        }

        if missing_key > 0 {
            warn!("Dropped {} {} records without a stream id", missing_key, section);
        }
        if duplicates > 0 {
            info!("Skipped {} duplicate {} records", duplicates, section);
        }
        self.progress.advance(FRACTION_COMMIT);

        let saved = channel_records.len() + vod_records.len();
        if !channel_records.is_empty() {
            self.channels
                .upsert_many(channel_records)
                .await
                .map_err(internal)?;
        }
        if !vod_records.is_empty() {
            self.vod_titles
                .upsert_many(vod_records)
                .await
                .map_err(internal)?;
        }
        if saved > 0 {
            info!("{} {} records saved to the catalog store", saved, section);
        }

        self.playlists
            .touch_last_synced(playlist.id, now)
            .await
            .map_err(internal)?;

        Ok(())
    }
}

fn internal(error: anyhow::Error) -> SyncFailure {
    SyncFailure::Internal(format!("{error:#}"))
}

/// Synthesize the playable live URL for a stream id.
///
/// The exact shape `{server}/live/{user}/{pass}/{id}.m3u8` is part of the
/// channel creation contract; players depend on it verbatim.
pub fn live_stream_url(account: &AccountInfo, stream_id: &str) -> String {
    let base = account.server_url.trim_end_matches('/');
    format!(
        "{base}/live/{}/{}/{stream_id}.m3u8",
        account.username, account.password
    )
}

/// Synthesize the playable VOD/series URL for a stream id
pub fn vod_stream_url(
    account: &AccountInfo,
    section: CatalogSection,
    stream_id: &str,
    container_extension: Option<&str>,
) -> String {
    let base = account.server_url.trim_end_matches('/');
    let prefix = match section {
        CatalogSection::Series => "series",
        _ => "movie",
    };
    let extension = container_extension
        .filter(|extension| !extension.is_empty())
        .unwrap_or("mp4");
    format!(
        "{base}/{prefix}/{}/{}/{stream_id}.{extension}",
        account.username, account.password
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountInfo {
        AccountInfo {
            server_url: "http://example.com:8080/".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        }
    }

    #[test]
    fn live_url_matches_the_playback_contract() {
        assert_eq!(
            live_stream_url(&account(), "42"),
            "http://example.com:8080/live/user/pass/42.m3u8"
        );
    }

    #[test]
    fn vod_url_uses_container_extension_with_mp4_fallback() {
        assert_eq!(
            vod_stream_url(&account(), CatalogSection::Vod, "7", Some("mkv")),
            "http://example.com:8080/movie/user/pass/7.mkv"
        );
        assert_eq!(
            vod_stream_url(&account(), CatalogSection::Vod, "7", None),
            "http://example.com:8080/movie/user/pass/7.mp4"
        );
        assert_eq!(
            vod_stream_url(&account(), CatalogSection::Series, "9", None),
            "http://example.com:8080/series/user/pass/9.mp4"
        );
    }
}
