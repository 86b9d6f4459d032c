//! Program-guide ingestion and eviction
//!
//! A smaller flow parallel to the catalog sync: given the stored channel
//! set, fetch the short EPG per channel concurrently and insert the
//! combined batch. The eviction sweep runs on its own cadence, since guide
//! entries go stale continuously, catalog entries only when the provider's
//! listing changes.

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::Database;
use crate::database::repositories::{ChannelRepository, EpgProgramRepository};
use crate::models::EpgProgramInsert;
use crate::preferences::PreferencesStore;
use crate::sources::CatalogProvider;
use crate::sync::progress::SyncFailure;

pub struct GuideSync {
    provider: Arc<dyn CatalogProvider>,
    preferences: PreferencesStore,
    channels: ChannelRepository,
    programs: EpgProgramRepository,
}

impl GuideSync {
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
            channels: ChannelRepository::new(connection.clone(), notifier.clone()),
            programs: EpgProgramRepository::new(connection, notifier),
        }
    }

    /// Fetch guide entries for every stored channel and insert them.
    ///
    /// Per-channel fetch failures are logged and excluded; malformed
    /// entries are dropped individually. Returns the number of entries
    /// written.
    pub async fn ingest_guide(&self, entries_per_channel: u32) -> Result<usize, SyncFailure> {
        let Some(account) = self.preferences.account_info().await else {
            warn!("No stored credentials, skipping guide ingestion");
            return Err(SyncFailure::NotAuthenticated);
        };

        let channels = self.channels.all().await.map_err(internal)?;
        let targets: Vec<(i64, String)> = channels
            .into_iter()
            .filter_map(|channel| {
                channel
                    .external_stream_id
                    .map(|stream_id| (channel.id, stream_id))
            })
            .collect();
        if targets.is_empty() {
            info!("No channels with stream ids, nothing to ingest");
            return Ok(0);
        }

        let mut tasks = FuturesUnordered::new();
        for (channel_id, stream_id) in targets {
            let provider = self.provider.clone();
            let account = account.clone();
            tasks.push(tokio::spawn(async move {
                let entries = provider
                    .short_epg(&account, &stream_id, entries_per_channel)
                    .await;
                (channel_id, stream_id, entries)
            }));
        }

        let mut records: Vec<EpgProgramInsert> = Vec::new();
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok((channel_id, _, Ok(entries))) => {
                    records.extend(entries.into_iter().map(|entry| EpgProgramInsert {
                        channel_id,
                        title: entry.title,
                        description: entry.description,
                        start_time: entry.start_time,
                        end_time: entry.end_time,
                    }));
                }
                Ok((_, stream_id, Err(error))) => {
                    warn!("Failed to fetch guide for stream {}: {}", stream_id, error);
                }
                Err(error) => warn!("Guide fetch task failed: {}", error),
            }
        }

        let inserted = self.programs.insert_many(records).await.map_err(internal)?;
        if inserted > 0 {
            info!("{} guide entries saved", inserted);
        }
        Ok(inserted)
    }

    /// Delete guide entries that ended strictly before `as_of`.
    ///
    /// Failures here are never fatal to the application; the caller logs
    /// and retries on the next scheduled cadence.
    pub async fn evict_expired(&self, as_of: DateTime<Utc>) -> anyhow::Result<u64> {
        let evicted = self.programs.evict_expired(as_of).await?;
        if evicted > 0 {
            info!("Evicted {} expired guide entries", evicted);
        }
        Ok(evicted)
    }
}

fn internal(error: anyhow::Error) -> SyncFailure {
    SyncFailure::Internal(format!("{error:#}"))
}
