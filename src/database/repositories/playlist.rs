//! Playlist (provider account) repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::sync::Arc;

use crate::database::ChangeNotifier;
use crate::entities::{playlists, prelude::Playlists};
use crate::models::{Playlist, SourceKind};

/// Repository for playlist rows, the roots of the catalog cascade graph
#[derive(Clone)]
pub struct PlaylistRepository {
    connection: Arc<DatabaseConnection>,
    notifier: ChangeNotifier,
}

impl PlaylistRepository {
    pub fn new(connection: Arc<DatabaseConnection>, notifier: ChangeNotifier) -> Self {
        Self {
            connection,
            notifier,
        }
    }

    /// Find or create the playlist row for a source URL, refreshing its
    /// metadata when it already exists
    pub async fn ensure(
        &self,
        name: &str,
        source_url: &str,
        kind: SourceKind,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Playlist> {
        let existing = Playlists::find()
            .filter(playlists::Column::SourceUrl.eq(source_url))
            .one(&*self.connection)
            .await?;

        let model = match existing {
            Some(model) => {
                let mut active: playlists::ActiveModel = model.into();
                active.name = Set(name.to_string());
                active.kind = Set(kind.to_string());
                active.expires_at = Set(expires_at);
                active.update(&*self.connection).await?
            }
            None => {
                let active = playlists::ActiveModel {
                    name: Set(name.to_string()),
                    source_url: Set(source_url.to_string()),
                    kind: Set(kind.to_string()),
                    expires_at: Set(expires_at),
                    last_synced_at: Set(None),
                    ..Default::default()
                };
                active.insert(&*self.connection).await?
            }
        };

        self.notifier.notify();
        model_to_domain(model)
    }

    /// Find the playlist row for a source URL, creating it if missing.
    ///
    /// Unlike [`Self::ensure`] an existing row is returned untouched, so a
    /// sync run never clobbers metadata written by the login flow.
    pub async fn find_or_create(
        &self,
        name: &str,
        source_url: &str,
        kind: SourceKind,
    ) -> Result<Playlist> {
        if let Some(playlist) = self.find_by_source_url(source_url).await? {
            return Ok(playlist);
        }

        let active = playlists::ActiveModel {
            name: Set(name.to_string()),
            source_url: Set(source_url.to_string()),
            kind: Set(kind.to_string()),
            expires_at: Set(None),
            last_synced_at: Set(None),
            ..Default::default()
        };
        let model = active.insert(&*self.connection).await?;
        self.notifier.notify();
        model_to_domain(model)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Playlist>> {
        let model = Playlists::find_by_id(id).one(&*self.connection).await?;
        model.map(model_to_domain).transpose()
    }

    pub async fn find_by_source_url(&self, source_url: &str) -> Result<Option<Playlist>> {
        let model = Playlists::find()
            .filter(playlists::Column::SourceUrl.eq(source_url))
            .one(&*self.connection)
            .await?;
        model.map(model_to_domain).transpose()
    }

    /// Stamp a successful sync
    pub async fn touch_last_synced(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let active = playlists::ActiveModel {
            id: Set(id),
            last_synced_at: Set(Some(at)),
            ..Default::default()
        };
        active.update(&*self.connection).await?;
        self.notifier.notify();
        Ok(())
    }

    /// Delete a playlist; categories, channels, VOD titles and guide entries
    /// go with it via foreign-key cascade. Watch progress is untouched.
    pub async fn delete(&self, id: i64) -> Result<u64> {
        let result = Playlists::delete_by_id(id).exec(&*self.connection).await?;
        self.notifier.notify();
        Ok(result.rows_affected)
    }
}

fn model_to_domain(model: playlists::Model) -> Result<Playlist> {
    let kind = model
        .kind
        .parse::<SourceKind>()
        .with_context(|| format!("unknown playlist kind '{}'", model.kind))?;
    Ok(Playlist {
        id: model.id,
        name: model.name,
        source_url: model.source_url,
        kind,
        expires_at: model.expires_at,
        last_synced_at: model.last_synced_at,
    })
}
