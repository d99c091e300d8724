//! armoury-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! ledger, and serves the JSON API under `/api`.
//!
//! Every setting can be overridden from the environment, e.g.
//! `ARMOURY_PORT=9000 ARMOURY_STORE_PATH=~/armoury.db armoury-server`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use armoury_core::ledger::Ledger;
use armoury_server::{ServerConfig, app, expand_tilde, spawn_change_logger};
use armoury_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Armoury issue/return ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ARMOURY").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  store
    .set_busy_timeout(server_cfg.busy_timeout())
    .await
    .context("failed to set store busy timeout")?;

  let ledger = Arc::new(Ledger::with_config(store, server_cfg.ledger_config()));
  spawn_change_logger(&ledger);

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(ledger)).await.context("server error")?;

  Ok(())
}
