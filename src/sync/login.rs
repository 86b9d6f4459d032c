//! Account login flow
//!
//! Authenticates against the provider, persists credentials and the expiry
//! display string, creates the playlist row, and flips the login flag. The
//! three authentication outcomes stay distinguishable for callers: rejected
//! credentials, unreachable server, and a reachable server that returned no
//! usable account info (see [`crate::errors::SourceError`]).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::database::Database;
use crate::database::repositories::PlaylistRepository;
use crate::errors::{AppError, AppResult};
use crate::models::SourceKind;
use crate::preferences::PreferencesStore;
use crate::sources::CatalogProvider;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub username: String,
    pub expiry_display: String,
}

pub struct LoginService {
    provider: Arc<dyn CatalogProvider>,
    preferences: PreferencesStore,
    playlists: PlaylistRepository,
}

impl LoginService {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        preferences: PreferencesStore,
        database: &Database,
    ) -> Self {
        Self {
            provider,
            preferences,
            playlists: PlaylistRepository::new(database.connection(), database.notifier()),
        }
    }

    /// Authenticate and persist the account.
    ///
    /// On failure nothing is persisted; a `SourceError` inside the returned
    /// `AppError` carries which of the three outcomes occurred.
    pub async fn login(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> AppResult<LoginOutcome> {
        let server_url = server_url.trim_end_matches('/');

        let user = self
            .provider
            .authenticate(server_url, username, password)
            .await?;

        let (expiry_display, expires_at) = format_expiry(user.expiry_raw.as_deref());

        self.preferences
            .save_account_info(server_url, username, password, &expiry_display)
            .await
            .map_err(to_internal)?;
        self.playlists
            .ensure(&user.username, server_url, SourceKind::Xtream, expires_at)
            .await
            .map_err(to_internal)?;
        self.preferences
            .set_logged_in(true)
            .await
            .map_err(to_internal)?;

        info!("Logged in as {} (expires: {})", user.username, expiry_display);
        Ok(LoginOutcome {
            username: user.username,
            expiry_display,
        })
    }

    /// Clear the stored account; the mirrored catalog itself is untouched
    pub async fn logout(&self) -> AppResult<()> {
        self.preferences.logout().await.map_err(to_internal)?;
        info!("Logged out");
        Ok(())
    }
}

fn to_internal(error: anyhow::Error) -> AppError {
    AppError::internal(format!("{error:#}"))
}

/// Human-readable expiry from the provider's raw value (epoch seconds as a
/// string). Zero, absent, or unparseable values display as "Unlimited".
fn format_expiry(raw: Option<&str>) -> (String, Option<DateTime<Utc>>) {
    let parsed = raw
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|&seconds| seconds > 0)
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0));

    match parsed {
        Some(expires_at) => (expires_at.format("%d.%m.%Y").to_string(), Some(expires_at)),
        None => ("Unlimited".to_string(), None),
    }
}
