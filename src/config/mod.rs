//! Service configuration
//!
//! Loaded with figment: built-in defaults, then an optional TOML file, then
//! `XTREAM_MIRROR_`-prefixed environment variables. Interval values are
//! humantime strings ("12h", "30m").

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite or PostgreSQL connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Path of the JSON preferences document
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cadence of full catalog syncs
    #[serde(default = "default_catalog_interval")]
    pub catalog_interval: String,
    /// Cadence of guide ingestion
    #[serde(default = "default_guide_interval")]
    pub guide_interval: String,
    /// Cadence of the expired-guide eviction sweep, decoupled from the
    /// catalog cadence
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: String,
    /// Guide entries requested per channel
    #[serde(default = "default_guide_entry_limit")]
    pub guide_entry_limit: u32,
}

fn default_database_url() -> String {
    "sqlite://./data/xtream-mirror.db".to_string()
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/preferences.json")
}

fn default_catalog_interval() -> String {
    "12h".to_string()
}

fn default_guide_interval() -> String {
    "1h".to_string()
}

fn default_sweep_interval() -> String {
    "30m".to_string()
}

fn default_guide_entry_limit() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: None,
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            catalog_interval: default_catalog_interval(),
            guide_interval: default_guide_interval(),
            sweep_interval: default_sweep_interval(),
            guide_entry_limit: default_guide_entry_limit(),
        }
    }
}

impl SyncConfig {
    pub fn catalog_interval(&self) -> Result<Duration> {
        parse_interval("sync.catalog_interval", &self.catalog_interval)
    }

    pub fn guide_interval(&self) -> Result<Duration> {
        parse_interval("sync.guide_interval", &self.guide_interval)
    }

    pub fn sweep_interval(&self) -> Result<Duration> {
        parse_interval("sync.sweep_interval", &self.sweep_interval)
    }
}

fn parse_interval(key: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).with_context(|| format!("Invalid {key} '{value}'"))
}

impl Config {
    /// Load configuration from defaults, an optional TOML file, and
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("XTREAM_MIRROR_").split("__"))
            .extract()
            .context("Failed to load configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete_and_parse() {
        let config = Config::load(None).unwrap();
        assert!(config.database.url.starts_with("sqlite:"));
        assert_eq!(
            config.sync.catalog_interval().unwrap(),
            Duration::from_secs(12 * 3600)
        );
        assert_eq!(
            config.sync.sweep_interval().unwrap(),
            Duration::from_secs(30 * 60)
        );
        assert_eq!(config.sync.guide_entry_limit, 10);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
url = "sqlite::memory:"

[sync]
catalog_interval = "6h"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(
            config.sync.catalog_interval().unwrap(),
            Duration::from_secs(6 * 3600)
        );
        // Untouched keys keep their defaults.
        assert_eq!(config.sync.guide_interval, "1h");
    }

    #[test]
    fn bad_interval_is_a_configuration_error() {
        let sync = SyncConfig {
            catalog_interval: "whenever".to_string(),
            ..SyncConfig::default()
        };
        assert!(sync.catalog_interval().is_err());
    }
}
