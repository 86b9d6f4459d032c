//! Category repository

use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use std::sync::Arc;

use super::INSERT_BATCH_SIZE;
use crate::database::ChangeNotifier;
use crate::entities::{categories, prelude::Categories};
use crate::models::{CatalogSection, Category, CategoryUpsert};

#[derive(Clone)]
pub struct CategoryRepository {
    connection: Arc<DatabaseConnection>,
    notifier: ChangeNotifier,
}

impl CategoryRepository {
    pub fn new(connection: Arc<DatabaseConnection>, notifier: ChangeNotifier) -> Self {
        Self {
            connection,
            notifier,
        }
    }

    /// Insert-or-replace a batch, keyed by (playlist, section, external id).
    ///
    /// Full-row replace: a re-fetched category overwrites the stored name.
    /// Duplicate names from upstream are expected and land as separate rows
    /// under their distinct external ids.
    pub async fn upsert_many(&self, records: Vec<CategoryUpsert>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let txn = self.connection.begin().await?;
        for chunk in records.chunks(INSERT_BATCH_SIZE) {
            let models = chunk.iter().map(|record| categories::ActiveModel {
                playlist_id: Set(record.playlist_id),
                external_id: Set(record.external_id.clone()),
                name: Set(record.name.clone()),
                section: Set(record.section.to_string()),
                ..Default::default()
            });

            Categories::insert_many(models)
                .on_conflict(
                    OnConflict::columns([
                        categories::Column::PlaylistId,
                        categories::Column::Section,
                        categories::Column::ExternalId,
                    ])
                    .update_column(categories::Column::Name)
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        self.notifier.notify();
        Ok(())
    }

    /// All categories of one section of a playlist, name-ordered
    pub async fn by_playlist_section(
        &self,
        playlist_id: i64,
        section: CatalogSection,
    ) -> Result<Vec<Category>> {
        let models = Categories::find()
            .filter(categories::Column::PlaylistId.eq(playlist_id))
            .filter(categories::Column::Section.eq(section.to_string()))
            .order_by_asc(categories::Column::Name)
            .all(&*self.connection)
            .await?;

        models.into_iter().map(model_to_domain).collect()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        let model = Categories::find_by_id(id).one(&*self.connection).await?;
        model.map(model_to_domain).transpose()
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(Categories::find().count(&*self.connection).await?)
    }
}

fn model_to_domain(model: categories::Model) -> Result<Category> {
    let section = model
        .section
        .parse::<CatalogSection>()
        .with_context(|| format!("unknown catalog section '{}'", model.section))?;
    Ok(Category {
        id: model.id,
        playlist_id: model.playlist_id,
        external_id: model.external_id,
        name: model.name,
        section,
    })
}
