//! Shared test infrastructure: in-memory databases, a scripted stub
//! provider, and preferences stores on temp files.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use xtream_mirror::config::DatabaseConfig;
use xtream_mirror::database::Database;
use xtream_mirror::errors::SourceError;
use xtream_mirror::models::CatalogSection;
use xtream_mirror::preferences::{AccountInfo, PreferencesStore};
use xtream_mirror::sources::{
    AuthenticatedUser, CatalogProvider, ProviderCategory, ProviderEpgEntry, ProviderStream,
};

/// Fresh migrated in-memory database.
///
/// A single pooled connection keeps every query on the same in-memory
/// SQLite instance.
pub async fn test_database() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
    };
    let database = Database::new(&config).await.expect("connect test database");
    database.migrate().await.expect("migrate test database");
    database
}

/// Preferences store on a temp file; keep the `TempDir` alive with the store
pub async fn test_preferences() -> (PreferencesStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = PreferencesStore::load(dir.path().join("settings.json"))
        .await
        .expect("open preferences store");
    (store, dir)
}

/// Store credentials matching [`StubProvider`]'s fixed account
pub async fn login_test_account(preferences: &PreferencesStore) {
    preferences
        .save_account_info("http://example.com", "user", "pass", "Unlimited")
        .await
        .unwrap();
}

pub fn test_account() -> AccountInfo {
    AccountInfo {
        server_url: "http://example.com".to_string(),
        username: "user".to_string(),
        password: "pass".to_string(),
    }
}

/// Scripted provider: categories, streams, and guide entries are fixed at
/// construction; selected categories can be marked as failing.
#[derive(Default)]
pub struct StubProvider {
    categories: HashMap<CatalogSection, Vec<ProviderCategory>>,
    streams: HashMap<String, Vec<ProviderStream>>,
    epg: HashMap<String, Vec<ProviderEpgEntry>>,
    failing_categories: HashSet<String>,
    pub network_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, section: CatalogSection, external_id: &str, name: &str) -> Self {
        self.categories
            .entry(section)
            .or_default()
            .push(ProviderCategory {
                external_id: external_id.to_string(),
                name: name.to_string(),
                parent_id: Some(0),
            });
        self
    }

    pub fn with_stream(mut self, category_external_id: &str, stream: ProviderStream) -> Self {
        self.streams
            .entry(category_external_id.to_string())
            .or_default()
            .push(stream);
        self
    }

    pub fn with_live_stream(self, category_external_id: &str, stream_id: &str, name: &str) -> Self {
        self.with_stream(
            category_external_id,
            ProviderStream {
                external_stream_id: Some(stream_id.to_string()),
                name: Some(name.to_string()),
                category_external_id: Some(category_external_id.to_string()),
                ..ProviderStream::default()
            },
        )
    }

    /// Stream fetches for this category fail with a provider error
    pub fn with_failing_category(mut self, category_external_id: &str) -> Self {
        self.failing_categories
            .insert(category_external_id.to_string());
        self
    }

    pub fn with_epg_entry(
        mut self,
        stream_id: &str,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        self.epg
            .entry(stream_id.to_string())
            .or_default()
            .push(ProviderEpgEntry {
                title: title.to_string(),
                description: None,
                start_time,
                end_time,
            });
        self
    }

    pub fn network_call_count(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for StubProvider {
    async fn authenticate(
        &self,
        _server_url: &str,
        username: &str,
        _password: &str,
    ) -> Result<AuthenticatedUser, SourceError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuthenticatedUser {
            username: username.to_string(),
            expiry_raw: Some("1767225600".to_string()),
        })
    }

    async fn categories(
        &self,
        _account: &AccountInfo,
        section: CatalogSection,
    ) -> Result<Vec<ProviderCategory>, SourceError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.categories.get(&section).cloned().unwrap_or_default())
    }

    async fn streams(
        &self,
        _account: &AccountInfo,
        _section: CatalogSection,
        category_external_id: &str,
    ) -> Result<Vec<ProviderStream>, SourceError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_categories.contains(category_external_id) {
            return Err(SourceError::Http {
                status: 500,
                body: "stub category failure".to_string(),
            });
        }
        Ok(self
            .streams
            .get(category_external_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn short_epg(
        &self,
        _account: &AccountInfo,
        stream_external_id: &str,
        _limit: u32,
    ) -> Result<Vec<ProviderEpgEntry>, SourceError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.epg.get(stream_external_id).cloned().unwrap_or_default())
    }
}
