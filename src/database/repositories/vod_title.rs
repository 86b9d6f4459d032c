//! VOD title repository

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::sync::Arc;

use super::INSERT_BATCH_SIZE;
use crate::database::ChangeNotifier;
use crate::entities::{prelude::VodTitles, vod_titles};
use crate::models::{VodTitle, VodTitleUpsert};

#[derive(Clone)]
pub struct VodTitleRepository {
    connection: Arc<DatabaseConnection>,
    notifier: ChangeNotifier,
}

impl VodTitleRepository {
    pub fn new(connection: Arc<DatabaseConnection>, notifier: ChangeNotifier) -> Self {
        Self {
            connection,
            notifier,
        }
    }

    /// Insert-or-replace a batch, keyed by the provider stream id
    /// (same replace-wholesale contract as channels)
    pub async fn upsert_many(&self, records: Vec<VodTitleUpsert>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let txn = self.connection.begin().await?;
        for chunk in records.chunks(INSERT_BATCH_SIZE) {
            let models = chunk.iter().map(|record| vod_titles::ActiveModel {
                category_id: Set(record.category_id),
                name: Set(record.name.clone()),
                logo_url: Set(record.logo_url.clone()),
                stream_url: Set(record.stream_url.clone()),
                external_stream_id: Set(record.external_stream_id.clone()),
                rating: Set(record.rating),
                release_date: Set(record.release_date.clone()),
                ..Default::default()
            });

            VodTitles::insert_many(models)
                .on_conflict(
                    OnConflict::column(vod_titles::Column::ExternalStreamId)
                        .update_columns([
                            vod_titles::Column::CategoryId,
                            vod_titles::Column::Name,
                            vod_titles::Column::LogoUrl,
                            vod_titles::Column::StreamUrl,
                            vod_titles::Column::Rating,
                            vod_titles::Column::ReleaseDate,
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

    pub async fn by_category(&self, category_id: i64) -> Result<Vec<VodTitle>> {
        let models = VodTitles::find()
            .filter(vod_titles::Column::CategoryId.eq(category_id))
            .order_by_asc(vod_titles::Column::Name)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    pub async fn find_by_external_stream_id(&self, stream_id: &str) -> Result<Option<VodTitle>> {
        let model = VodTitles::find()
            .filter(vod_titles::Column::ExternalStreamId.eq(stream_id))
            .one(&*self.connection)
            .await?;
        Ok(model.map(model_to_domain))
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(VodTitles::find().count(&*self.connection).await?)
    }
}

fn model_to_domain(model: vod_titles::Model) -> VodTitle {
    VodTitle {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        logo_url: model.logo_url,
        stream_url: model.stream_url,
        external_stream_id: model.external_stream_id,
        rating: model.rating,
        release_date: model.release_date,
    }
}
