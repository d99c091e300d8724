//! Configuration and wiring for the Armoury ledger server.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use armoury_core::{
  ledger::{Ledger, LedgerConfig},
  retry::RetryPolicy,
  store::LedgerStore,
};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Config ───────────────────────────────────────────────────────────────────

/// Server settings, read from `config.toml` and `ARMOURY_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Upper bound on a single store call.
  pub store_timeout_secs: u64,
  /// Total attempts for a read before a transient failure is reported.
  pub read_attempts:      usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8080,
      store_path:         PathBuf::from("armoury.db"),
      store_timeout_secs: 10,
      read_attempts:      3,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  fn store_timeout(&self) -> Duration { Duration::from_secs(self.store_timeout_secs.max(1)) }

  /// Half the read timeout, so a contended write fails with a definite
  /// outcome before a read waiting behind it would give up.
  pub fn busy_timeout(&self) -> Duration { self.store_timeout() / 2 }

  pub fn ledger_config(&self) -> LedgerConfig {
    let defaults = RetryPolicy::default();
    LedgerConfig {
      timeout: self.store_timeout(),
      retry: RetryPolicy::new(self.read_attempts, defaults.base_delay, defaults.max_delay),
      ..LedgerConfig::default()
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api` with request tracing.
pub fn app<S>(ledger: Arc<Ledger<S>>) -> Router
where
  S: LedgerStore + 'static,
{
  Router::new()
    .nest("/api", armoury_api::api_router(ledger))
    .layer(TraceLayer::new_for_http())
}

/// Log every change published on the ledger's bus until it closes.
pub fn spawn_change_logger<S>(ledger: &Ledger<S>) -> tokio::task::JoinHandle<()>
where
  S: LedgerStore,
{
  let mut changes = ledger.subscribe();
  tokio::spawn(async move {
    while changes.changed().await.is_some() {
      tracing::debug!("ledger changed");
    }
  })
}
