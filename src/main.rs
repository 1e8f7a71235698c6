//! shiftlist
//!
//! Daily checklist service: master task templates, per-day employee copies,
//! and an end-of-day rollover that archives outcomes and redeploys.

use anyhow::Result;
use clap::Parser;
use mockable::{Clock, DefaultClock};
use shiftlist::api::{self, ApiServer};
use shiftlist::auth::Gatekeeper;
use shiftlist::cli::{Cli, Command};
use shiftlist::config::{Config, ConfigLoader};
use shiftlist::db::Database;
use shiftlist::db::expiry::spawn_reaper;
use shiftlist::lifecycle::{Lifecycle, LifecyclePolicy};
use shiftlist::logging::{self, LogTarget};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit --config replaces the tier lookup
    // SAFETY: set at startup before the runtime spawns any tasks that read env
    if let Some(config_path) = &cli.config {
        unsafe {
            std::env::set_var("SHIFTLIST_CONFIG_PATH", config_path);
        }
    }
    let mut loader = ConfigLoader::load()?;
    if let Some(path) = loader.config_path() {
        info!(path = %path.display(), tiers = ?loader.tiers(), "Loaded configuration");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.storage.db_path = db_path.into();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let config = loader.into_config();
    config.validate()?;

    match cli.command {
        Some(Command::Rollover) => run_rollover(&config),
        Some(Command::Purge) => run_purge(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

fn open_database(config: &Config) -> Result<Arc<Database>> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.storage.db_path)?;
    info!(path = %config.storage.db_path.display(), "Database opened");
    Ok(Arc::new(db))
}

fn build_engine(config: &Config, db: Arc<Database>) -> Lifecycle {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(DefaultClock);
    Lifecycle::new(db, clock, LifecyclePolicy::from(&config.lifecycle))
}

/// Run one rollover as the trusted local scheduler.
fn run_rollover(config: &Config) -> Result<()> {
    let engine = build_engine(config, open_database(config)?);
    let summary = engine.rollover()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Run the expiry reaper once.
fn run_purge(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let now = DefaultClock.utc().timestamp_millis();
    let stats = db.purge_expired(now)?;
    info!(tasks = stats.tasks, archives = stats.archives, "Purge complete");
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    let engine = Arc::new(build_engine(&config, Arc::clone(&db)));

    let gate = Gatekeeper::from_config(&config.auth);
    if config.auth.admin_password.is_none() {
        tracing::warn!("No admin password configured; admin operations will be rejected");
    }
    if config.auth.cron_secret.is_none() {
        tracing::warn!("No cron secret configured; scheduled rollovers will be rejected");
    }

    let reaper = spawn_reaper(
        Arc::clone(&db),
        Arc::clone(engine.clock()),
        Duration::from_secs(config.storage.sweep_interval_secs),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let (shutdown_tx, bound_addr) = api::start_server(ApiServer::new(engine, gate), addr).await?;
    info!("shiftlist ready on http://{}", bound_addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(());
    reaper.shutdown();
    Ok(())
}
