//! Remote catalog provider clients
//!
//! The synchronization engine depends on the [`CatalogProvider`] trait, not
//! on a concrete client, so tests and future source kinds can substitute
//! their own implementation. [`xtream::XtreamClient`] is the production
//! implementation against the Xtream Codes `player_api.php` protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::SourceError;
use crate::models::CatalogSection;
use crate::preferences::AccountInfo;

pub mod xtream;

pub use xtream::XtreamClient;

/// Successful authentication result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    /// Raw provider expiry value (usually epoch seconds as a string)
    pub expiry_raw: Option<String>,
}

/// A category as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCategory {
    pub external_id: String,
    pub name: String,
    pub parent_id: Option<i64>,
}

/// A stream entry as listed by the provider, normalized across sections
///
/// Every field except the natural key is best-effort; the provider is
/// untrusted and inconsistent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderStream {
    pub external_stream_id: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub category_external_id: Option<String>,
    pub epg_channel_key: Option<String>,
    pub rating: Option<f32>,
    pub release_date: Option<String>,
    pub container_extension: Option<String>,
}

/// A short-EPG listing entry, decoded and time-parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEpgEntry {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Stateless request/response client against a remote catalog provider
///
/// No retries here; retry policy belongs to the synchronization engine.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Authenticate against the provider.
    ///
    /// The three failure modes stay distinguishable: rejected credentials
    /// ([`SourceError::AuthenticationFailed`]), unreachable server
    /// ([`SourceError::Network`]), and a 2xx response without usable account
    /// info ([`SourceError::MissingAccountInfo`]).
    async fn authenticate(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, SourceError>;

    /// List a section's categories, in provider order
    async fn categories(
        &self,
        account: &AccountInfo,
        section: CatalogSection,
    ) -> Result<Vec<ProviderCategory>, SourceError>;

    /// List one category's streams, in provider order
    async fn streams(
        &self,
        account: &AccountInfo,
        section: CatalogSection,
        category_external_id: &str,
    ) -> Result<Vec<ProviderStream>, SourceError>;

    /// Fetch the short EPG for one stream
    async fn short_epg(
        &self,
        account: &AccountInfo,
        stream_external_id: &str,
        limit: u32,
    ) -> Result<Vec<ProviderEpgEntry>, SourceError>;
}
