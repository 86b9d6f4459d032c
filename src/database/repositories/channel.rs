//! Channel repository

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::sync::Arc;

use super::INSERT_BATCH_SIZE;
use crate::database::ChangeNotifier;
use crate::entities::{channels, prelude::Channels};
use crate::models::{Channel, ChannelUpsert};

#[derive(Clone)]
pub struct ChannelRepository {
    connection: Arc<DatabaseConnection>,
    notifier: ChangeNotifier,
}

impl ChannelRepository {
    pub fn new(connection: Arc<DatabaseConnection>, notifier: ChangeNotifier) -> Self {
        Self {
            connection,
            notifier,
        }
    }

    /// Insert-or-replace a batch, keyed by the provider stream id.
    ///
    /// A record sharing its `external_stream_id` with a stored row replaces
    /// that row wholesale (no field merge). Records without a stream id never
    /// conflict and insert as new rows.
    pub async fn upsert_many(&self, records: Vec<ChannelUpsert>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let txn = self.connection.begin().await?;
        for chunk in records.chunks(INSERT_BATCH_SIZE) {
            let models = chunk.iter().map(|record| channels::ActiveModel {
                category_id: Set(record.category_id),
                name: Set(record.name.clone()),
                logo_url: Set(record.logo_url.clone()),
                stream_url: Set(record.stream_url.clone()),
                external_stream_id: Set(record.external_stream_id.clone()),
                epg_channel_key: Set(record.epg_channel_key.clone()),
                ..Default::default()
            });

            Channels::insert_many(models)
                .on_conflict(
                    OnConflict::column(channels::Column::ExternalStreamId)
                        .update_columns([
                            channels::Column::CategoryId,
                            channels::Column::Name,
                            channels::Column::LogoUrl,
                            channels::Column::StreamUrl,
                            channels::Column::EpgChannelKey,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        self.notifier.notify();
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<Channel>> {
        let models = Channels::find()
            .order_by_asc(channels::Column::Id)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    pub async fn by_category(&self, category_id: i64) -> Result<Vec<Channel>> {
        let models = Channels::find()
            .filter(channels::Column::CategoryId.eq(category_id))
            .order_by_asc(channels::Column::Name)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    pub async fn find_by_external_stream_id(&self, stream_id: &str) -> Result<Option<Channel>> {
        let model = Channels::find()
            .filter(channels::Column::ExternalStreamId.eq(stream_id))
            .one(&*self.connection)
            .await?;
        Ok(model.map(model_to_domain))
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Channels::find().count(&*self.connection).await?)
    }
}

pub(crate) fn model_to_domain(model: channels::Model) -> Channel {
    Channel {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        logo_url: model.logo_url,
        stream_url: model.stream_url,
        external_stream_id: model.external_stream_id,
        epg_channel_key: model.epg_channel_key,
    }
}
