//! Credential & selection store
//!
//! Durable key-value persistence for provider credentials, the login flag,
//! and the per-section selected-category sets. Backed by a single JSON
//! document rewritten atomically (temp file + rename) under a write lock:
//! each edit is atomic across the keys it touches, concurrent writers
//! serialize, and readers never observe a partial write.
//!
//! The login flag is additionally published on a `tokio::sync::watch`
//! channel so dependent components can react without polling; a fresh
//! subscriber sees the current value immediately.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::models::CatalogSection;

/// Stored provider credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub server_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferencesDocument {
    #[serde(default)]
    logged_in: bool,
    #[serde(default)]
    server_url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    expiry_display: Option<String>,
    #[serde(default)]
    live_categories: BTreeSet<String>,
    #[serde(default)]
    vod_categories: BTreeSet<String>,
    #[serde(default)]
    series_categories: BTreeSet<String>,
}

impl PreferencesDocument {
    fn selections(&self, section: CatalogSection) -> &BTreeSet<String> {
        match section {
            CatalogSection::Live => &self.live_categories,
            CatalogSection::Vod => &self.vod_categories,
            CatalogSection::Series => &self.series_categories,
        }
    }
}

/// File-backed preferences store with process lifetime
#[derive(Clone)]
pub struct PreferencesStore {
    path: PathBuf,
    state: Arc<RwLock<PreferencesDocument>>,
    logged_in_tx: Arc<watch::Sender<bool>>,
}

impl PreferencesStore {
    /// Open the store, loading the document if the file already exists
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| {
                format!("Failed to parse preferences file {}", path.display())
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences file at {}, starting empty", path.display());
                PreferencesDocument::default()
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Failed to read preferences file {}", path.display()));
            }
        };

        let (logged_in_tx, _) = watch::channel(document.logged_in);
        Ok(Self {
            path,
            state: Arc::new(RwLock::new(document)),
            logged_in_tx: Arc::new(logged_in_tx),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn set_logged_in(&self, logged_in: bool) -> Result<()> {
        self.edit(|document| document.logged_in = logged_in).await
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.logged_in
    }

    /// Live login signal; the receiver holds the current value immediately
    pub fn watch_logged_in(&self) -> watch::Receiver<bool> {
        self.logged_in_tx.subscribe()
    }

    /// [`Self::watch_logged_in`] as a stream: the current value first, then
    /// every change
    pub fn logged_in_stream(&self) -> WatchStream<bool> {
        WatchStream::new(self.logged_in_tx.subscribe())
    }

    pub async fn save_account_info(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
        expiry_display: &str,
    ) -> Result<()> {
        self.edit(|document| {
            document.server_url = Some(server_url.to_string());
            document.username = Some(username.to_string());
            document.password = Some(password.to_string());
            document.expiry_display = Some(expiry_display.to_string());
        })
        .await
    }

    /// Stored credentials, or `None` while any field is absent
    pub async fn account_info(&self) -> Option<AccountInfo> {
        let document = self.state.read().await;
        Some(AccountInfo {
            server_url: document.server_url.clone()?,
            username: document.username.clone()?,
            password: document.password.clone()?,
        })
    }

    pub async fn expiry_display(&self) -> Option<String> {
        self.state.read().await.expiry_display.clone()
    }

    /// Replace all three per-section selection sets in one edit
    pub async fn save_category_selections(
        &self,
        live: impl IntoIterator<Item = String>,
        vod: impl IntoIterator<Item = String>,
        series: impl IntoIterator<Item = String>,
    ) -> Result<()> {
        let live: BTreeSet<String> = live.into_iter().collect();
        let vod: BTreeSet<String> = vod.into_iter().collect();
        let series: BTreeSet<String> = series.into_iter().collect();
        self.edit(|document| {
            document.live_categories = live;
            document.vod_categories = vod;
            document.series_categories = series;
        })
        .await
    }

    pub async fn selected_categories(&self, section: CatalogSection) -> BTreeSet<String> {
        self.state.read().await.selections(section).clone()
    }

    /// Clear every key atomically
    pub async fn logout(&self) -> Result<()> {
        self.edit(|document| *document = PreferencesDocument::default())
            .await
    }

    async fn edit<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut PreferencesDocument),
    {
        let mut document = self.state.write().await;
        apply(&mut document);
        self.persist(&document).await?;
        // Publish only after the durable write succeeded.
        let logged_in = document.logged_in;
        self.logged_in_tx.send_if_modified(|current| {
            if *current != logged_in {
                *current = logged_in;
                true
            } else {
                false
            }
        });
        Ok(())
    }

    async fn persist(&self, document: &PreferencesDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create preferences directory {}", parent.display())
            })?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("Failed to write preferences file {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace preferences file {}", self.path.display()))?;
        Ok(())
    }
}
