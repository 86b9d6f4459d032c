//! EPG program repository
//!
//! Guide entries carry no provider-side natural key, so the write path is a
//! surrogate-keyed insert; growth is bounded by the eviction sweep rather
//! than by reconciliation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::warn;

use super::INSERT_BATCH_SIZE;
use crate::database::ChangeNotifier;
use crate::entities::{epg_programs, prelude::EpgPrograms};
use crate::models::{EpgProgram, EpgProgramInsert};

#[derive(Clone)]
pub struct EpgProgramRepository {
    connection: Arc<DatabaseConnection>,
    notifier: ChangeNotifier,
}

impl EpgProgramRepository {
    pub fn new(connection: Arc<DatabaseConnection>, notifier: ChangeNotifier) -> Self {
        Self {
            connection,
            notifier,
        }
    }

    /// Insert a batch of guide entries.
    ///
    /// Entries violating `start_time < end_time` are dropped individually
    /// with a warning; upstream guides are untrusted and a bad record must
    /// not fail the batch.
    pub async fn insert_many(&self, records: Vec<EpgProgramInsert>) -> Result<usize> {
        let (valid, invalid): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|record| record.start_time < record.end_time);

        if !invalid.is_empty() {
            warn!(
                "Dropping {} guide entries with non-positive duration",
                invalid.len()
            );
        }
        if valid.is_empty() {
            return Ok(0);
        }

        let inserted = valid.len();
        let txn = self.connection.begin().await?;
        for chunk in valid.chunks(INSERT_BATCH_SIZE) {
            let models = chunk.iter().map(|record| epg_programs::ActiveModel {
                channel_id: Set(record.channel_id),
                title: Set(record.title.clone()),
                description: Set(record.description.clone()),
                start_time: Set(record.start_time),
                end_time: Set(record.end_time),
                ..Default::default()
            });
            EpgPrograms::insert_many(models)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        self.notifier.notify();
        Ok(inserted)
    }

    /// Delete every entry that ended strictly before `as_of`.
    ///
    /// An entry with `end_time == as_of` survives the sweep.
    pub async fn evict_expired(&self, as_of: DateTime<Utc>) -> Result<u64> {
        let result = EpgPrograms::delete_many()
            .filter(epg_programs::Column::EndTime.lt(as_of))
            .exec(&*self.connection)
            .await?;

        if result.rows_affected > 0 {
            self.notifier.notify();
        }
        Ok(result.rows_affected)
    }

    /// All entries for a channel, start-time ascending
    pub async fn by_channel(&self, channel_id: i64) -> Result<Vec<EpgProgram>> {
        let models = EpgPrograms::find()
            .filter(epg_programs::Column::ChannelId.eq(channel_id))
            .order_by_asc(epg_programs::Column::StartTime)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(EpgPrograms::find().count(&*self.connection).await?)
    }
}

pub(crate) fn model_to_domain(model: epg_programs::Model) -> EpgProgram {
    EpgProgram {
        id: model.id,
        channel_id: model.channel_id,
        title: model.title,
        description: model.description,
        start_time: model.start_time,
        end_time: model.end_time,
    }
}
