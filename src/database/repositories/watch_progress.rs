//! Watch progress repository
//!
//! The only write path is the playback-reporting boundary; catalog sync
//! never touches these rows, and they sit outside the playlist cascade
//! graph on purpose. Writes do not feed the catalog change notifier.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use std::sync::Arc;

use crate::entities::{prelude::WatchProgress as WatchProgressEntity, watch_progress};
use crate::models::{WatchKind, WatchProgress};

#[derive(Clone)]
pub struct WatchProgressRepository {
    connection: Arc<DatabaseConnection>,
}

impl WatchProgressRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Save playback position, replacing any stored row for the stream id.
    ///
    /// Saving twice with the same id leaves exactly one row.
    pub async fn save_progress(
        &self,
        external_stream_id: &str,
        kind: WatchKind,
        position_ms: i64,
        duration_ms: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let model = watch_progress::ActiveModel {
            external_stream_id: Set(external_stream_id.to_string()),
            kind: Set(kind.to_string()),
            position_ms: Set(position_ms),
            duration_ms: Set(duration_ms),
            last_watched_at: Set(at),
            ..Default::default()
        };

        WatchProgressEntity::insert(model)
            .on_conflict(
                OnConflict::column(watch_progress::Column::ExternalStreamId)
                    .update_columns([
                        watch_progress::Column::Kind,
                        watch_progress::Column::PositionMs,
                        watch_progress::Column::DurationMs,
                        watch_progress::Column::LastWatchedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.connection)
            .await?;

        Ok(())
    }

    pub async fn find_by_stream_id(&self, external_stream_id: &str) -> Result<Option<WatchProgress>> {
        let model = WatchProgressEntity::find()
            .filter(watch_progress::Column::ExternalStreamId.eq(external_stream_id))
            .one(&*self.connection)
            .await?;
        model.map(model_to_domain).transpose()
    }

    /// Stored playback position for a stream, if any
    pub async fn position(&self, external_stream_id: &str) -> Result<Option<i64>> {
        Ok(self
            .find_by_stream_id(external_stream_id)
            .await?
            .map(|progress| progress.position_ms))
    }

    pub async fn clear(&self, external_stream_id: &str) -> Result<u64> {
        let result = WatchProgressEntity::delete_many()
            .filter(watch_progress::Column::ExternalStreamId.eq(external_stream_id))
            .exec(&*self.connection)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(WatchProgressEntity::find().count(&*self.connection).await?)
    }
}

fn model_to_domain(model: watch_progress::Model) -> Result<WatchProgress> {
    let kind = model
        .kind
        .parse::<WatchKind>()
        .with_context(|| format!("unknown watch kind '{}'", model.kind))?;
    Ok(WatchProgress {
        id: model.id,
        external_stream_id: model.external_stream_id,
        kind,
        position_ms: model.position_ms,
        duration_ms: model.duration_ms,
        last_watched_at: model.last_watched_at,
    })
}
