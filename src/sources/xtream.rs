//! Xtream Codes provider client
//!
//! Request/response client against the `player_api.php` protocol: the caller
//! supplies a fully-formed base URL plus credentials, and every operation is
//! a single HTTP GET with an `action` query parameter.
//!
//! Provider responses are notoriously sloppy: numeric fields arrive as
//! strings or integers interchangeably, expected fields go missing, and the
//! short-EPG endpoint base64-encodes its text. Parsing here is lenient
//! throughout: a malformed field becomes "field missing", never a hard
//! failure.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{AuthenticatedUser, CatalogProvider, ProviderCategory, ProviderEpgEntry, ProviderStream};
use crate::errors::SourceError;
use crate::models::CatalogSection;
use crate::preferences::AccountInfo;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_BODY_LIMIT: usize = 500;

/// Xtream Codes API client
#[derive(Clone)]
pub struct XtreamClient {
    client: Client,
}

impl XtreamClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Build the `player_api.php` URL for an action
    fn api_url(
        server_url: &str,
        username: &str,
        password: &str,
        action: Option<&str>,
        extra: &[(&str, &str)],
    ) -> Result<url::Url, SourceError> {
        let url_to_parse = if server_url.starts_with("http://") || server_url.starts_with("https://")
        {
            server_url.to_string()
        } else {
            format!("http://{server_url}")
        };

        let parsed = url::Url::parse(&url_to_parse)
            .map_err(|e| SourceError::invalid_url(format!("'{server_url}': {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| SourceError::invalid_url(format!("'{server_url}': missing host")))?;
        let base_url = if let Some(port) = parsed.port() {
            format!("{}://{}:{}", parsed.scheme(), host, port)
        } else {
            format!("{}://{}", parsed.scheme(), host)
        };

        let mut url = url::Url::parse(&format!("{base_url}/player_api.php"))
            .map_err(|e| SourceError::invalid_url(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("username", username);
            pairs.append_pair("password", password);
            if let Some(action) = action {
                pairs.append_pair("action", action);
            }
            for (key, value) in extra {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: url::Url,
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SourceError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(SourceError::Network)?;

        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        serde_json::from_str(&body).map_err(|e| SourceError::parse(e.to_string()))
    }
}

impl Default for XtreamClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogProvider for XtreamClient {
    async fn authenticate(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, SourceError> {
        let url = Self::api_url(server_url, username, password, None, &[])?;
        debug!("Authenticating against {}", server_url);

        let response: XtreamAuthResponse = match self.fetch_json(url).await {
            Ok(response) => response,
            // A rejected login is a distinct outcome, not a generic provider error.
            Err(SourceError::Http { status, body }) => {
                return Err(SourceError::AuthenticationFailed { status, body });
            }
            Err(other) => return Err(other),
        };

        match response.user_info {
            Some(user_info) => match user_info.username {
                Some(username) if !username.is_empty() => Ok(AuthenticatedUser {
                    username,
                    expiry_raw: user_info.exp_date,
                }),
                // Degenerate success: reachable server, 2xx, nothing usable.
                _ => Err(SourceError::MissingAccountInfo),
            },
            None => Err(SourceError::MissingAccountInfo),
        }
    }

    async fn categories(
        &self,
        account: &AccountInfo,
        section: CatalogSection,
    ) -> Result<Vec<ProviderCategory>, SourceError> {
        let url = Self::api_url(
            &account.server_url,
            &account.username,
            &account.password,
            Some(section.categories_action()),
            &[],
        )?;

        let raw: Vec<XtreamCategory> = self.fetch_json(url).await?;
        debug!("Fetched {} {} categories", raw.len(), section);

        Ok(raw
            .into_iter()
            .filter_map(|category| {
                Some(ProviderCategory {
                    name: category
                        .category_name
                        .clone()
                        .or_else(|| category.category_id.clone())?,
                    external_id: category.category_id?,
                    parent_id: category.parent_id,
                })
            })
            .collect())
    }

    async fn streams(
        &self,
        account: &AccountInfo,
        section: CatalogSection,
        category_external_id: &str,
    ) -> Result<Vec<ProviderStream>, SourceError> {
        let url = Self::api_url(
            &account.server_url,
            &account.username,
            &account.password,
            Some(section.streams_action()),
            &[("category_id", category_external_id)],
        )?;

        let raw: Vec<XtreamStream> = self.fetch_json(url).await?;
        debug!(
            "Fetched {} streams for {} category {}",
            raw.len(),
            section,
            category_external_id
        );

        Ok(raw
            .into_iter()
            .map(|stream| ProviderStream {
                external_stream_id: stream.stream_id,
                name: stream.name.filter(|name| !name.is_empty()),
                logo_url: stream.stream_icon.filter(|logo| !logo.is_empty()),
                category_external_id: stream.category_id,
                epg_channel_key: stream.epg_channel_id.filter(|key| !key.is_empty()),
                rating: stream.rating,
                release_date: stream.release_date,
                container_extension: stream.container_extension,
            })
            .collect())
    }

    async fn short_epg(
        &self,
        account: &AccountInfo,
        stream_external_id: &str,
        limit: u32,
    ) -> Result<Vec<ProviderEpgEntry>, SourceError> {
        let limit = limit.to_string();
        let url = Self::api_url(
            &account.server_url,
            &account.username,
            &account.password,
            Some("get_short_epg"),
            &[("stream_id", stream_external_id), ("limit", &limit)],
        )?;

        let raw: XtreamEpgResponse = self.fetch_json(url).await?;

        let mut entries = Vec::new();
        for listing in raw.epg_listings {
            // An entry without both timestamps cannot be placed on the
            // guide; drop it alone, not the batch.
            let (Some(start), Some(stop)) = (listing.start_timestamp, listing.stop_timestamp)
            else {
                debug!("Dropping guide entry without timestamps");
                continue;
            };
            let (Some(start_time), Some(end_time)) =
                (DateTime::from_timestamp(start, 0), DateTime::from_timestamp(stop, 0))
            else {
                debug!("Dropping guide entry with out-of-range timestamps");
                continue;
            };

            entries.push(ProviderEpgEntry {
                title: listing
                    .title
                    .as_deref()
                    .map(decode_epg_text)
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                description: listing
                    .description
                    .as_deref()
                    .map(decode_epg_text)
                    .filter(|description| !description.is_empty()),
                start_time,
                end_time,
            });
        }
        Ok(entries)
    }
}

/// Decode the base64 text fields of the short-EPG endpoint, falling back to
/// the raw value when it is not valid base64
fn decode_epg_text(raw: &str) -> String {
    match BASE64.decode(raw.trim()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        body.to_string()
    } else {
        let mut end = limit;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body[..end].to_string()
    }
}

// ---------------------------------------------------------------------------
// Wire shapes. Everything optional, everything lenient.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct XtreamAuthResponse {
    #[serde(default)]
    user_info: Option<XtreamUserInfo>,
}

#[derive(Debug, Deserialize)]
struct XtreamUserInfo {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    exp_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XtreamCategory {
    #[serde(default, deserialize_with = "lenient_string_option")]
    category_id: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64_option")]
    parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct XtreamStream {
    // Series listings carry `series_id` where live/VOD carry `stream_id`.
    #[serde(default, alias = "series_id", deserialize_with = "lenient_string_option")]
    stream_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    // Series listings carry `cover` where live/VOD carry `stream_icon`.
    #[serde(default, alias = "cover")]
    stream_icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_option")]
    category_id: Option<String>,
    #[serde(default)]
    epg_channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32_option")]
    rating: Option<f32>,
    #[serde(default, alias = "releasedate")]
    release_date: Option<String>,
    #[serde(default)]
    container_extension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XtreamEpgResponse {
    #[serde(default)]
    epg_listings: Vec<XtreamEpgListing>,
}

#[derive(Debug, Deserialize)]
struct XtreamEpgListing {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64_option")]
    start_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64_option")]
    stop_timestamp: Option<i64>,
}

// Helper functions for deserialization. Providers encode the same field as a
// string, an integer, or null depending on the installation; an unparseable
// value is treated as absent rather than failing the record.

fn lenient_string_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, a number, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

fn lenient_i64_option<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct IntVisitor;

    impl<'de> Visitor<'de> for IntVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer, a string integer, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(i64::try_from(value).ok())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as i64))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse().ok())
        }
    }

    deserializer.deserialize_any(IntVisitor)
}

fn lenient_f32_option<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = Option<f32>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, a string number, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f32))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f32))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f32))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse().ok())
        }
    }

    deserializer.deserialize_any(FloatVisitor)
}
