//! Login flow tests: the three authentication outcomes stay
//! distinguishable, and a successful login persists account state.

mod common;

use async_trait::async_trait;
use std::sync::Arc;

use common::{StubProvider, test_database, test_preferences};
use xtream_mirror::database::repositories::PlaylistRepository;
use xtream_mirror::errors::{AppError, SourceError};
use xtream_mirror::models::{CatalogSection, SourceKind};
use xtream_mirror::preferences::AccountInfo;
use xtream_mirror::sources::{
    AuthenticatedUser, CatalogProvider, ProviderCategory, ProviderEpgEntry, ProviderStream,
};
use xtream_mirror::sync::LoginService;

/// Provider whose authenticate always yields a fixed error
struct FailingAuthProvider(fn() -> SourceError);

#[async_trait]
impl CatalogProvider for FailingAuthProvider {
    async fn authenticate(
        &self,
        _server_url: &str,
        _username: &str,
        _password: &str,
    ) -> Result<AuthenticatedUser, SourceError> {
        Err((self.0)())
    }

    async fn categories(
        &self,
        _account: &AccountInfo,
        _section: CatalogSection,
    ) -> Result<Vec<ProviderCategory>, SourceError> {
        Ok(Vec::new())
    }

    async fn streams(
        &self,
        _account: &AccountInfo,
        _section: CatalogSection,
        _category_external_id: &str,
    ) -> Result<Vec<ProviderStream>, SourceError> {
        Ok(Vec::new())
    }

    async fn short_epg(
        &self,
        _account: &AccountInfo,
        _stream_external_id: &str,
        _limit: u32,
    ) -> Result<Vec<ProviderEpgEntry>, SourceError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn successful_login_persists_account_and_playlist() {
    let database = test_database().await;
    let (preferences, _dir) = test_preferences().await;
    let service = LoginService::new(Arc::new(StubProvider::new()), preferences.clone(), &database);

    let mut logged_in = preferences.watch_logged_in();
    assert!(!*logged_in.borrow());

    let outcome = service
        .login("http://example.com/", "user", "pass")
        .await
        .unwrap();
    assert_eq!(outcome.username, "user");
    assert_eq!(outcome.expiry_display, "01.01.2026");

    // Credentials stored with the trailing slash trimmed.
    let account = preferences.account_info().await.unwrap();
    assert_eq!(account.server_url, "http://example.com");
    assert_eq!(preferences.expiry_display().await.unwrap(), "01.01.2026");
    assert!(preferences.is_logged_in().await);
    logged_in.changed().await.unwrap();
    assert!(*logged_in.borrow());

    let playlists = PlaylistRepository::new(database.connection(), database.notifier());
    let playlist = playlists
        .find_by_source_url("http://example.com")
        .await
        .unwrap()
        .expect("playlist created by login");
    assert_eq!(playlist.kind, SourceKind::Xtream);
    assert!(playlist.expires_at.is_some());
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication_failure() {
    let database = test_database().await;
    let (preferences, _dir) = test_preferences().await;
    let provider = Arc::new(FailingAuthProvider(|| SourceError::AuthenticationFailed {
        status: 401,
        body: "invalid credentials".to_string(),
    }));
    let service = LoginService::new(provider, preferences.clone(), &database);

    let error = service
        .login("http://example.com", "user", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        AppError::Source(SourceError::AuthenticationFailed { status: 401, .. })
    ));

    // Nothing persisted on failure.
    assert!(!preferences.is_logged_in().await);
    assert!(preferences.account_info().await.is_none());
}

#[tokio::test]
async fn unreachable_server_stays_distinct_from_bad_credentials() {
    let database = test_database().await;
    let (preferences, _dir) = test_preferences().await;
    // A real transport error, produced without any network: reqwest refuses
    // the unsupported scheme before dialing.
    let provider = Arc::new(StubNetworkErrorProvider);
    let service = LoginService::new(provider, preferences.clone(), &database);

    let error = service
        .login("http://example.invalid", "user", "pass")
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Source(SourceError::Network(_))));
    assert!(!preferences.is_logged_in().await);
}

#[tokio::test]
async fn degenerate_success_surfaces_missing_account_info() {
    let database = test_database().await;
    let (preferences, _dir) = test_preferences().await;
    let provider = Arc::new(FailingAuthProvider(|| SourceError::MissingAccountInfo));
    let service = LoginService::new(provider, preferences.clone(), &database);

    let error = service
        .login("http://example.com", "user", "pass")
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        AppError::Source(SourceError::MissingAccountInfo)
    ));
    assert!(!preferences.is_logged_in().await);
}

#[tokio::test]
async fn logout_clears_the_stored_account() {
    let database = test_database().await;
    let (preferences, _dir) = test_preferences().await;
    let service = LoginService::new(Arc::new(StubProvider::new()), preferences.clone(), &database);

    service
        .login("http://example.com", "user", "pass")
        .await
        .unwrap();
    assert!(preferences.is_logged_in().await);

    service.logout().await.unwrap();
    assert!(!preferences.is_logged_in().await);
    assert!(preferences.account_info().await.is_none());
}

/// Provider that produces a genuine `reqwest` transport error
struct StubNetworkErrorProvider;

#[async_trait]
impl CatalogProvider for StubNetworkErrorProvider {
    async fn authenticate(
        &self,
        _server_url: &str,
        _username: &str,
        _password: &str,
    ) -> Result<AuthenticatedUser, SourceError> {
        // `foo://` is rejected by the client builder's request machinery,
        // yielding a transport-class error without touching the network.
        let error = reqwest::get("foo://nowhere.invalid").await.unwrap_err();
        Err(SourceError::Network(error))
    }

    async fn categories(
        &self,
        _account: &AccountInfo,
        _section: CatalogSection,
    ) -> Result<Vec<ProviderCategory>, SourceError> {
        Ok(Vec::new())
    }

    async fn streams(
        &self,
        _account: &AccountInfo,
        _section: CatalogSection,
        _category_external_id: &str,
    ) -> Result<Vec<ProviderStream>, SourceError> {
        Ok(Vec::new())
    }

    async fn short_epg(
        &self,
        _account: &AccountInfo,
        _stream_external_id: &str,
        _limit: u32,
    ) -> Result<Vec<ProviderEpgEntry>, SourceError> {
        Ok(Vec::new())
    }
}
