use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_playlists_table(manager).await?;
        self.create_categories_table(manager).await?;
        self.create_channels_table(manager).await?;
        self.create_vod_titles_table(manager).await?;
        self.create_epg_programs_table(manager).await?;
        self.create_watch_progress_table(manager).await?;

        // Create indexes
        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(WatchProgress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EpgPrograms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VodTitles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlists::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    // Helper functions for database-specific types
    fn create_id_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            // BIGSERIAL surrogate keys
            sea_orm::DatabaseBackend::Postgres => col.big_integer().not_null().auto_increment(),
            // SQLite only auto-increments INTEGER PRIMARY KEY (64-bit rowid)
            _ => col.integer().not_null().auto_increment(),
        };
        col
    }

    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_nullable_timestamp_column(
        &self,
        manager: &SchemaManager,
        column: impl IntoIden,
    ) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone(),
            _ => col.string(),
        };
        col
    }

    // Table creation methods
    async fn create_playlists_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Playlists::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Playlists::Id).primary_key())
                    .col(ColumnDef::new(Playlists::Name).string().not_null())
                    .col(ColumnDef::new(Playlists::SourceUrl).string().not_null())
                    .col(ColumnDef::new(Playlists::Kind).string().not_null())
                    .col(self.create_nullable_timestamp_column(manager, Playlists::ExpiresAt))
                    .col(self.create_nullable_timestamp_column(manager, Playlists::LastSyncedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_categories_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Categories::Id).primary_key())
                    .col(ColumnDef::new(Categories::PlaylistId).big_integer().not_null())
                    .col(ColumnDef::new(Categories::ExternalId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Section).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_playlist_id")
                            .from(Categories::Table, Categories::PlaylistId)
                            .to(Playlists::Table, Playlists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_channels_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Channels::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Channels::Id).primary_key())
                    .col(ColumnDef::new(Channels::CategoryId).big_integer().not_null())
                    .col(ColumnDef::new(Channels::Name).string().not_null())
                    .col(ColumnDef::new(Channels::LogoUrl).string())
                    .col(ColumnDef::new(Channels::StreamUrl).string().not_null())
                    .col(ColumnDef::new(Channels::ExternalStreamId).string())
                    .col(ColumnDef::new(Channels::EpgChannelKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_channels_category_id")
                            .from(Channels::Table, Channels::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_vod_titles_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VodTitles::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, VodTitles::Id).primary_key())
                    .col(ColumnDef::new(VodTitles::CategoryId).big_integer().not_null())
                    .col(ColumnDef::new(VodTitles::Name).string().not_null())
                    .col(ColumnDef::new(VodTitles::LogoUrl).string())
                    .col(ColumnDef::new(VodTitles::StreamUrl).string().not_null())
                    .col(ColumnDef::new(VodTitles::ExternalStreamId).string())
                    .col(ColumnDef::new(VodTitles::Rating).float())
                    .col(ColumnDef::new(VodTitles::ReleaseDate).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vod_titles_category_id")
                            .from(VodTitles::Table, VodTitles::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_epg_programs_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EpgPrograms::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, EpgPrograms::Id).primary_key())
                    .col(ColumnDef::new(EpgPrograms::ChannelId).big_integer().not_null())
                    .col(ColumnDef::new(EpgPrograms::Title).string().not_null())
                    .col(ColumnDef::new(EpgPrograms::Description).string())
                    .col(self.create_timestamp_column(manager, EpgPrograms::StartTime))
                    .col(self.create_timestamp_column(manager, EpgPrograms::EndTime))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_epg_programs_channel_id")
                            .from(EpgPrograms::Table, EpgPrograms::ChannelId)
                            .to(Channels::Table, Channels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_watch_progress_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        // Deliberately no foreign keys: progress is keyed by the provider
        // stream id and must survive resyncs that replace catalog rows.
        manager
            .create_table(
                Table::create()
                    .table(WatchProgress::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, WatchProgress::Id).primary_key())
                    .col(
                        ColumnDef::new(WatchProgress::ExternalStreamId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WatchProgress::Kind).string().not_null())
                    .col(
                        ColumnDef::new(WatchProgress::PositionMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WatchProgress::DurationMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(self.create_timestamp_column(manager, WatchProgress::LastWatchedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_playlist_id")
                    .table(Categories::Table)
                    .col(Categories::PlaylistId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_section_name")
                    .table(Categories::Table)
                    .col(Categories::Section)
                    .col(Categories::Name)
                    .to_owned(),
            )
            .await?;
        // Natural key for category reconciliation
        manager
            .create_index(
                Index::create()
                    .name("uq_categories_playlist_section_external")
                    .table(Categories::Table)
                    .col(Categories::PlaylistId)
                    .col(Categories::Section)
                    .col(Categories::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_channels_category_id")
                    .table(Channels::Table)
                    .col(Channels::CategoryId)
                    .to_owned(),
            )
            .await?;
        // Natural key for channel reconciliation (NULLs exempt)
        manager
            .create_index(
                Index::create()
                    .name("uq_channels_external_stream_id")
                    .table(Channels::Table)
                    .col(Channels::ExternalStreamId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_vod_titles_category_id")
                    .table(VodTitles::Table)
                    .col(VodTitles::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_vod_titles_external_stream_id")
                    .table(VodTitles::Table)
                    .col(VodTitles::ExternalStreamId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_epg_programs_channel_id")
                    .table(EpgPrograms::Table)
                    .col(EpgPrograms::ChannelId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_epg_programs_start_end")
                    .table(EpgPrograms::Table)
                    .col(EpgPrograms::StartTime)
                    .col(EpgPrograms::EndTime)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_watch_progress_external_stream_id")
                    .table(WatchProgress::Table)
                    .col(WatchProgress::ExternalStreamId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Playlists {
    Table,
    Id,
    Name,
    SourceUrl,
    Kind,
    ExpiresAt,
    LastSyncedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    PlaylistId,
    ExternalId,
    Name,
    Section,
}

#[derive(DeriveIden)]
enum Channels {
    Table,
    Id,
    CategoryId,
    Name,
    LogoUrl,
    StreamUrl,
    ExternalStreamId,
    EpgChannelKey,
}

#[derive(DeriveIden)]
enum VodTitles {
    Table,
    Id,
    CategoryId,
    Name,
    LogoUrl,
    StreamUrl,
    ExternalStreamId,
    Rating,
    ReleaseDate,
}

#[derive(DeriveIden)]
enum EpgPrograms {
    Table,
    Id,
    ChannelId,
    Title,
    Description,
    StartTime,
    EndTime,
}

#[derive(DeriveIden)]
enum WatchProgress {
    Table,
    Id,
    ExternalStreamId,
    Kind,
    PositionMs,
    DurationMs,
    LastWatchedAt,
}
