//! SeaORM-based database implementation
//!
//! Database-agnostic access with support for SQLite (the default, offline
//! store) and PostgreSQL. The `Database` also owns the store-wide
//! [`ChangeNotifier`] that live query subscriptions hang off: every committed
//! write batch bumps a revision counter, and subscribers re-read the
//! post-commit state when it changes.

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseBackend, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

pub mod migrations;
pub mod repositories;

/// Store-wide change signal for live query subscriptions
///
/// A monotonically increasing revision behind a `tokio::sync::watch` channel.
/// Writers call [`ChangeNotifier::notify`] after their transaction commits;
/// readers never observe a revision for an uncommitted batch. Intermediate
/// revisions may be coalesced by the channel, which is fine: subscribers
/// re-query the current state, not a delta.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: Arc<watch::Sender<u64>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0u64);
        Self { tx: Arc::new(tx) }
    }

    /// Signal that a write batch has committed
    pub fn notify(&self) {
        self.tx.send_modify(|revision| *revision += 1);
    }

    /// Subscribe to committed-write notifications
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Current committed revision
    pub fn revision(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    connection: Arc<DatabaseConnection>,
    backend: DatabaseBackend,
    database_type: DatabaseType,
    notifier: ChangeNotifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    SQLite,
    PostgreSQL,
}

impl Database {
    /// Create a new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_type = Self::detect_database_type(&config.url)?;
        let backend = match database_type {
            DatabaseType::SQLite => DatabaseBackend::Sqlite,
            DatabaseType::PostgreSQL => DatabaseBackend::Postgres,
        };

        info!("Connecting to {} database", database_type.as_str());

        let connection_url = match database_type {
            DatabaseType::SQLite => Self::ensure_sqlite_auto_creation(&config.url)?,
            DatabaseType::PostgreSQL => config.url.clone(),
        };

        let mut connect_options = ConnectOptions::new(&connection_url);
        connect_options
            .max_connections(config.max_connections.unwrap_or(10))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging(false);

        let connection = SeaOrmDatabase::connect(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database at '{}'", config.url))?;

        debug!("Database connection established");

        Ok(Self {
            connection: Arc::new(connection),
            backend,
            database_type,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Detect the database type from the URL
    fn detect_database_type(url: &str) -> Result<DatabaseType> {
        if url.starts_with("sqlite:") {
            Ok(DatabaseType::SQLite)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(DatabaseType::PostgreSQL)
        } else {
            anyhow::bail!("Unsupported database URL format: {}", url);
        }
    }

    /// Ensure a file-backed SQLite URL creates its file and directories on first run
    fn ensure_sqlite_auto_creation(url: &str) -> Result<String> {
        if url.contains("mode=") || url.contains(":memory:") {
            return Ok(url.to_string());
        }

        let file_path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .ok_or_else(|| anyhow::anyhow!("Invalid SQLite URL format: {}", url))?;

        let path = std::path::Path::new(file_path);
        if path.exists() {
            return Ok(url.to_string());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create directory for SQLite database: {}",
                    parent.display()
                )
            })?;
            info!("Created directory for SQLite database: {}", parent.display());
        }

        let auto_create_url = if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        };
        Ok(auto_create_url)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        use migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        info!(
            "Running database migrations for {}",
            self.database_type.as_str()
        );

        Migrator::up(&*self.connection, None)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Get the database connection
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.connection.clone()
    }

    /// Get the store-wide change notifier
    pub fn notifier(&self) -> ChangeNotifier {
        self.notifier.clone()
    }

    /// Get the database backend type
    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Get the database type
    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "SQLite",
            DatabaseType::PostgreSQL => "PostgreSQL",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_database_type_from_url() {
        assert_eq!(
            Database::detect_database_type("sqlite::memory:").unwrap(),
            DatabaseType::SQLite
        );
        assert_eq!(
            Database::detect_database_type("postgres://localhost/mirror").unwrap(),
            DatabaseType::PostgreSQL
        );
        assert!(Database::detect_database_type("mysql://localhost/mirror").is_err());
    }

    #[tokio::test]
    async fn notifier_bumps_revision_and_wakes_subscribers() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();
        assert_eq!(notifier.revision(), 0);

        notifier.notify();
        assert_eq!(notifier.revision(), 1);
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        notifier.notify();
        notifier.notify();
        // Coalesced: one wakeup, latest revision visible.
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 3);
    }
}
