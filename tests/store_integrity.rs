//! Local store integrity tests: cascade deletion, eviction boundaries,
//! and watch-progress idempotence.

mod common;

use chrono::{Duration, TimeZone, Utc};

use common::test_database;
use xtream_mirror::database::repositories::{
    CategoryRepository, ChannelRepository, EpgProgramRepository, PlaylistRepository,
    VodTitleRepository, WatchProgressRepository,
};
use xtream_mirror::models::{
    CatalogSection, CategoryUpsert, ChannelUpsert, EpgProgramInsert, SourceKind, VodTitleUpsert,
    WatchKind,
};

struct Fixture {
    playlists: PlaylistRepository,
    categories: CategoryRepository,
    channels: ChannelRepository,
    vod_titles: VodTitleRepository,
    programs: EpgProgramRepository,
    watch: WatchProgressRepository,
}

impl Fixture {
    fn new(database: &xtream_mirror::database::Database) -> Self {
        Self {
            playlists: PlaylistRepository::new(database.connection(), database.notifier()),
            categories: CategoryRepository::new(database.connection(), database.notifier()),
            channels: ChannelRepository::new(database.connection(), database.notifier()),
            vod_titles: VodTitleRepository::new(database.connection(), database.notifier()),
            programs: EpgProgramRepository::new(database.connection(), database.notifier()),
            watch: WatchProgressRepository::new(database.connection()),
        }
    }

    /// Playlist → category → channel (+ one guide entry) → vod title
    async fn seed_catalog(&self) -> i64 {
        let playlist = self
            .playlists
            .find_or_create("acct", "http://example.com", SourceKind::Xtream)
            .await
            .unwrap();
        self.categories
            .upsert_many(vec![
                CategoryUpsert {
                    playlist_id: playlist.id,
                    external_id: "10".to_string(),
                    name: "News".to_string(),
                    section: CatalogSection::Live,
                },
                CategoryUpsert {
                    playlist_id: playlist.id,
                    external_id: "40".to_string(),
                    name: "Movies".to_string(),
                    section: CatalogSection::Vod,
                },
            ])
            .await
            .unwrap();

        let live = self
            .categories
            .by_playlist_section(playlist.id, CatalogSection::Live)
            .await
            .unwrap();
        let vod = self
            .categories
            .by_playlist_section(playlist.id, CatalogSection::Vod)
            .await
            .unwrap();

        self.channels
            .upsert_many(vec![ChannelUpsert {
                category_id: live[0].id,
                name: "News One".to_string(),
                logo_url: None,
                stream_url: "http://example.com/live/u/p/101.m3u8".to_string(),
                external_stream_id: Some("101".to_string()),
                epg_channel_key: None,
            }])
            .await
            .unwrap();
        self.vod_titles
            .upsert_many(vec![VodTitleUpsert {
                category_id: vod[0].id,
                name: "Some Film".to_string(),
                logo_url: None,
                stream_url: "http://example.com/movie/u/p/401.mp4".to_string(),
                external_stream_id: Some("401".to_string()),
                rating: None,
                release_date: None,
            }])
            .await
            .unwrap();

        let channel = self
            .channels
            .find_by_external_stream_id("101")
            .await
            .unwrap()
            .unwrap();
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        self.programs
            .insert_many(vec![EpgProgramInsert {
                channel_id: channel.id,
                title: "Noon News".to_string(),
                description: None,
                start_time: start,
                end_time: start + Duration::hours(1),
            }])
            .await
            .unwrap();

        playlist.id
    }
}

#[tokio::test]
async fn deleting_a_playlist_cascades_through_the_catalog() {
    let database = test_database().await;
    let fixture = Fixture::new(&database);
    let playlist_id = fixture.seed_catalog().await;

    // Watch progress shares the stream id but sits outside the cascade graph.
    fixture
        .watch
        .save_progress("101", WatchKind::Vod, 60_000, 3_600_000, Utc::now())
        .await
        .unwrap();

    assert_eq!(fixture.categories.count().await.unwrap(), 2);
    assert_eq!(fixture.channels.count().await.unwrap(), 1);
    assert_eq!(fixture.vod_titles.count().await.unwrap(), 1);
    assert_eq!(fixture.programs.count().await.unwrap(), 1);

    let deleted = fixture.playlists.delete(playlist_id).await.unwrap();
    assert_eq!(deleted, 1);

    assert_eq!(fixture.categories.count().await.unwrap(), 0);
    assert_eq!(fixture.channels.count().await.unwrap(), 0);
    assert_eq!(fixture.vod_titles.count().await.unwrap(), 0);
    assert_eq!(fixture.programs.count().await.unwrap(), 0);
    // The progress row survives.
    assert_eq!(fixture.watch.count().await.unwrap(), 1);
    assert_eq!(fixture.watch.position("101").await.unwrap(), Some(60_000));
}

#[tokio::test]
async fn eviction_boundary_is_strictly_before_now() {
    let database = test_database().await;
    let fixture = Fixture::new(&database);
    fixture.seed_catalog().await;
    let channel = fixture
        .channels
        .find_by_external_stream_id("101")
        .await
        .unwrap()
        .unwrap();

    let now = Utc.with_ymd_and_hms(2026, 2, 1, 18, 0, 0).unwrap();
    fixture
        .programs
        .insert_many(vec![
            EpgProgramInsert {
                channel_id: channel.id,
                title: "Ends a second ago".to_string(),
                description: None,
                start_time: now - Duration::hours(1),
                end_time: now - Duration::seconds(1),
            },
            EpgProgramInsert {
                channel_id: channel.id,
                title: "Ends exactly now".to_string(),
                description: None,
                start_time: now - Duration::hours(1),
                end_time: now,
            },
            EpgProgramInsert {
                channel_id: channel.id,
                title: "Still running".to_string(),
                description: None,
                start_time: now - Duration::minutes(30),
                end_time: now + Duration::minutes(30),
            },
        ])
        .await
        .unwrap();

    let evicted = fixture.programs.evict_expired(now).await.unwrap();
    // Seeded "Noon News" (ended 13:00) plus "Ends a second ago".
    assert_eq!(evicted, 2);

    let remaining = fixture.programs.by_channel(channel.id).await.unwrap();
    let titles: Vec<&str> = remaining.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Ends exactly now", "Still running"]);
}

#[tokio::test]
async fn channel_upsert_replaces_the_whole_row_by_natural_key() {
    let database = test_database().await;
    let fixture = Fixture::new(&database);
    let playlist_id = fixture.seed_catalog().await;
    let live = fixture
        .categories
        .by_playlist_section(playlist_id, CatalogSection::Live)
        .await
        .unwrap();

    let before = fixture
        .channels
        .find_by_external_stream_id("101")
        .await
        .unwrap()
        .unwrap();

    // Re-fetched record: same natural key, different fields.
    fixture
        .channels
        .upsert_many(vec![ChannelUpsert {
            category_id: live[0].id,
            name: "News One HD".to_string(),
            logo_url: Some("http://example.com/logo.png".to_string()),
            stream_url: "http://example.com/live/u/p/101.m3u8".to_string(),
            external_stream_id: Some("101".to_string()),
            epg_channel_key: Some("news.one".to_string()),
        }])
        .await
        .unwrap();

    assert_eq!(fixture.channels.count().await.unwrap(), 1);
    let after = fixture
        .channels
        .find_by_external_stream_id("101")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.name, "News One HD");
    assert_eq!(after.epg_channel_key.as_deref(), Some("news.one"));
    assert_eq!(after.logo_url.as_deref(), Some("http://example.com/logo.png"));
}

#[tokio::test]
async fn duplicate_category_names_do_not_break_reconciliation() {
    let database = test_database().await;
    let fixture = Fixture::new(&database);
    let playlist = fixture
        .playlists
        .find_or_create("acct", "http://example.com", SourceKind::Xtream)
        .await
        .unwrap();

    // Upstream serves two categories with the same display name; they stay
    // distinct rows under their external ids.
    fixture
        .categories
        .upsert_many(vec![
            CategoryUpsert {
                playlist_id: playlist.id,
                external_id: "1".to_string(),
                name: "Sports".to_string(),
                section: CatalogSection::Live,
            },
            CategoryUpsert {
                playlist_id: playlist.id,
                external_id: "2".to_string(),
                name: "Sports".to_string(),
                section: CatalogSection::Live,
            },
        ])
        .await
        .unwrap();

    let rows = fixture
        .categories
        .by_playlist_section(playlist.id, CatalogSection::Live)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    // Re-upserting one of them by natural key updates in place.
    fixture
        .categories
        .upsert_many(vec![CategoryUpsert {
            playlist_id: playlist.id,
            external_id: "2".to_string(),
            name: "Sports Extra".to_string(),
            section: CatalogSection::Live,
        }])
        .await
        .unwrap();
    let rows = fixture
        .categories
        .by_playlist_section(playlist.id, CatalogSection::Live)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|category| category.name == "Sports Extra"));
}

#[tokio::test]
async fn watch_progress_saves_are_idempotent_by_stream_id() {
    let database = test_database().await;
    let fixture = Fixture::new(&database);
    let at = Utc.with_ymd_and_hms(2026, 2, 1, 20, 0, 0).unwrap();

    fixture
        .watch
        .save_progress("401", WatchKind::Vod, 10_000, 7_200_000, at)
        .await
        .unwrap();
    fixture
        .watch
        .save_progress("401", WatchKind::Vod, 95_000, 7_200_000, at + Duration::minutes(2))
        .await
        .unwrap();

    assert_eq!(fixture.watch.count().await.unwrap(), 1);
    let progress = fixture
        .watch
        .find_by_stream_id("401")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(progress.position_ms, 95_000);
    assert_eq!(progress.kind, WatchKind::Vod);
    assert!((progress.percent_complete() - 95_000.0 / 7_200_000.0 * 100.0).abs() < 1e-9);

    assert_eq!(fixture.watch.clear("401").await.unwrap(), 1);
    assert_eq!(fixture.watch.position("401").await.unwrap(), None);
}
