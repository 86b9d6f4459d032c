//! xtream-mirror service binary
//!
//! Wires the catalog mirror together and acts as the external scheduler the
//! sync engine itself deliberately lacks: catalog syncs, guide ingestion,
//! and the eviction sweep each run on their own interval until ctrl-c.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xtream_mirror::config::Config;
use xtream_mirror::database::Database;
use xtream_mirror::models::CatalogSection;
use xtream_mirror::preferences::PreferencesStore;
use xtream_mirror::sources::{CatalogProvider, XtreamClient};
use xtream_mirror::sync::{GuideSync, SyncEngine};

#[derive(Parser, Debug)]
#[command(name = "xtream-mirror", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the database URL from configuration
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    let preferences = PreferencesStore::load(&config.preferences.path).await?;
    let provider: Arc<dyn CatalogProvider> = Arc::new(XtreamClient::new());

    let engine = SyncEngine::new(provider.clone(), preferences.clone(), &database);
    let guide = GuideSync::new(provider, preferences, &database);

    let mut catalog_timer = tokio::time::interval(config.sync.catalog_interval()?);
    let mut guide_timer = tokio::time::interval(config.sync.guide_interval()?);
    let mut sweep_timer = tokio::time::interval(config.sync.sweep_interval()?);
    catalog_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    guide_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    sweep_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!("xtream-mirror started");

    loop {
        tokio::select! {
            _ = catalog_timer.tick() => {
                for section in CatalogSection::iter() {
                    engine.sync_catalog(section, Utc::now()).await;
                }
            }
            _ = guide_timer.tick() => {
                if let Err(error) = guide.ingest_guide(config.sync.guide_entry_limit).await {
                    warn!("Guide ingestion failed: {}", error);
                }
            }
            _ = sweep_timer.tick() => {
                if let Err(error) = guide.evict_expired(Utc::now()).await {
                    warn!("Eviction sweep failed, will retry next cadence: {error:#}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
