//! Read-model projections over the catalog store
//!
//! Thin query compositions with no state of their own. Time-parameterized
//! queries take "now" from the caller, never from a wall clock, so every
//! projection is deterministic and testable.
//!
//! Live variants are restartable snapshot streams: a fresh subscriber
//! receives the current snapshot immediately, then a new snapshot after
//! each committed write batch. Joins are computed in a single query, so a
//! subscriber never observes a channel joined against a half-written batch.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::Stream;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::warn;

use crate::database::repositories::{channel, epg_program};
use crate::database::{ChangeNotifier, Database};
use crate::entities::{channels, epg_programs, prelude::{Channels, EpgPrograms}};
use crate::models::{ChannelWithPrograms, EpgProgram};

#[derive(Clone)]
pub struct CatalogProjections {
    connection: Arc<DatabaseConnection>,
    notifier: ChangeNotifier,
}

impl CatalogProjections {
    pub fn new(database: &Database) -> Self {
        Self {
            connection: database.connection(),
            notifier: database.notifier(),
        }
    }

    /// Every channel joined with its guide entries, start-time ascending
    pub async fn channels_with_programs(&self) -> Result<Vec<ChannelWithPrograms>> {
        let rows = Channels::find()
            .find_with_related(EpgPrograms)
            .order_by_asc(channels::Column::Id)
            .order_by_asc(epg_programs::Column::StartTime)
            .all(&*self.connection)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(channel_model, program_models)| ChannelWithPrograms {
                channel: channel::model_to_domain(channel_model),
                programs: program_models
                    .into_iter()
                    .map(epg_program::model_to_domain)
                    .collect(),
            })
            .collect())
    }

    /// Live variant of [`Self::channels_with_programs`]
    pub fn channels_with_programs_stream(
        &self,
    ) -> impl Stream<Item = Vec<ChannelWithPrograms>> + Send + 'static {
        let this = self.clone();
        let mut revisions = self.notifier.subscribe();
        async_stream::stream! {
            loop {
                match this.channels_with_programs().await {
                    Ok(snapshot) => yield snapshot,
                    Err(error) => warn!("channels_with_programs query failed: {error:#}"),
                }
                if revisions.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// The program airing on a channel at `at`, if any.
    ///
    /// The end boundary is inclusive (`end_time >= at`), matching observed
    /// guide behavior; at the instant one program hands over to the next,
    /// the later-starting entry wins.
    pub async fn current_program(
        &self,
        channel_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<EpgProgram>> {
        let model = EpgPrograms::find()
            .filter(epg_programs::Column::ChannelId.eq(channel_id))
            .filter(epg_programs::Column::StartTime.lte(at))
            .filter(epg_programs::Column::EndTime.gte(at))
            .order_by_desc(epg_programs::Column::StartTime)
            .one(&*self.connection)
            .await?;

        Ok(model.map(epg_program::model_to_domain))
    }

    /// Programs on a channel that have not yet ended at `after`,
    /// start-time ascending
    pub async fn upcoming_programs(
        &self,
        channel_id: i64,
        after: DateTime<Utc>,
    ) -> Result<Vec<EpgProgram>> {
        let models = EpgPrograms::find()
            .filter(epg_programs::Column::ChannelId.eq(channel_id))
            .filter(epg_programs::Column::EndTime.gt(after))
            .order_by_asc(epg_programs::Column::StartTime)
            .all(&*self.connection)
            .await?;

        Ok(models.into_iter().map(epg_program::model_to_domain).collect())
    }

    /// Live variant of [`Self::upcoming_programs`]
    pub fn upcoming_programs_stream(
        &self,
        channel_id: i64,
        after: DateTime<Utc>,
    ) -> impl Stream<Item = Vec<EpgProgram>> + Send + 'static {
        let this = self.clone();
        let mut revisions = self.notifier.subscribe();
        async_stream::stream! {
            loop {
                match this.upcoming_programs(channel_id, after).await {
                    Ok(snapshot) => yield snapshot,
                    Err(error) => warn!("upcoming_programs query failed: {error:#}"),
                }
                if revisions.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}
