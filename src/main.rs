//! Taskboard server
//!
//! Serves the per-user task API over HTTP, backed by SQLite.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taskboard::api::start_server;
use taskboard::cli::{Cli, Command};
use taskboard::config::{Config, ENV_CONFIG_PATH};
use taskboard::db::Database;
use taskboard::logging::{self, LogTarget};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // Explicit config path: --config, then TASKBOARD_CONFIG_PATH
    let explicit_config = cli
        .config
        .clone()
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok())
        .map(PathBuf::from);

    let (mut config, config_path) = Config::discover(explicit_config.as_deref())?;
    config.apply_env();
    cli.apply_overrides(&mut config);

    match &config_path {
        Some(path) => info!("Config file: {:?}", path),
        None => info!("No config file found, using defaults"),
    }

    config.ensure_db_dir()?;
    info!("Database: {:?}", config.server.db_path);
    let db = Database::open(&config.server.db_path)?;

    match cli.command {
        Some(Command::Migrate) => {
            info!("Database migrations applied");
        }
        Some(Command::Serve) | None => {
            run_server(config, db).await?;
        }
    }

    Ok(())
}

/// Run the HTTP server until Ctrl-C.
async fn run_server(config: Config, db: Database) -> Result<()> {
    let handle = start_server(Arc::new(db), &config.server.host, config.server.port).await?;
    info!("Taskboard ready on http://{}", handle.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    handle.shutdown().await;
    Ok(())
}
