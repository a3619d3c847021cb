//! HTTP server wiring for shiftover.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use serde::Deserialize;
use shiftover_core::store::{ScheduleStore, UserDirectory};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_busy_timeout_ms() -> u64 { 5_000 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `SHIFTOVER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// How long a writer waits for another writer's lock before giving up.
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u64,
}

impl ServerConfig {
  pub fn busy_timeout(&self) -> Duration { Duration::from_millis(self.busy_timeout_ms) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Load configuration from an optional TOML file overlaid with environment
/// variables.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "shiftover.db")?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("SHIFTOVER"))
    .build()?
    .try_deserialize()
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

/// The full application: the JSON API under `/api`, with request tracing.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: ScheduleStore + UserDirectory + 'static,
  <S as ScheduleStore>::Error: From<<S as UserDirectory>::Error>,
{
  Router::new()
    .nest("/api", shiftover_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
