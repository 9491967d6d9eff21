//! dashmon - a command-line dashboard for the device and camera monitoring API.
//!
//! Logs in against the backend, keeps the access and refresh tokens in the
//! configured store, and exposes users, devices, cameras, alerts and
//! settings as subcommands.

mod cli;
mod commands;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dashmon_core::{
    ApiClient, Config, FileStore, KeyringStore, MemoryStore, StoreKind, TokenStore,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use commands::RunContext;

/// Log file name prefix; the appender adds the date
const LOG_FILE_PREFIX: &str = "dashmon.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn open_store(kind: StoreKind, config: &Config) -> Result<Arc<dyn TokenStore>> {
    Ok(match kind {
        StoreKind::Keyring => Arc::new(KeyringStore::new()),
        StoreKind::File => Arc::new(FileStore::new(&config.cache_dir()?)),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    let log_dir = if cli.log_file {
        Some(config.cache_dir()?)
    } else {
        None
    };
    let _log_guard = init_tracing(log_dir.as_deref());

    if let Some(base) = cli.api_base.clone() {
        config.api_base = base;
    }
    let store_kind = cli.store.unwrap_or(config.store);
    info!(api_base = %config.api_base, store = ?store_kind, "dashmon starting");

    let store = open_store(store_kind, &config)?;
    let client = ApiClient::from_config(&config, store).context("Failed to create API client")?;

    let ctx = RunContext {
        client: &client,
        config: &mut config,
        json: cli.json,
    };
    commands::run(cli.command, ctx).await
}
