//! Redil HTTP server: configuration, store bootstrap, and the application
//! router that mounts the JSON API under `/api`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use redil_core::{
  Record,
  store::Store,
  user::{Role, User},
};
use redil_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// `store_path` value that selects a transient in-memory database.
pub const IN_MEMORY: &str = ":memory:";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `REDIL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Username of the administrator seeded into an empty store.
  pub admin_username:      String,
  /// argon2 PHC string for the seeded administrator.
  #[serde(default)]
  pub admin_password_hash: Option<String>,
}

impl ServerConfig {
  /// Layer defaults, the TOML file at `path` (if present), and the
  /// environment, in increasing precedence.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080_i64)?
      .set_default("store_path", "redil.db")?
      .set_default("admin_username", "admin")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("REDIL"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
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

// ─── Store ───────────────────────────────────────────────────────────────────

/// Open the store named by `store_path`: [`IN_MEMORY`] or a file path.
pub async fn open_store(path: &Path) -> redil_store_sqlite::Result<SqliteStore> {
  if path.as_os_str() == IN_MEMORY {
    tracing::warn!("using an in-memory store; data will not survive a restart");
    return SqliteStore::open_in_memory().await;
  }
  SqliteStore::open(expand_tilde(path)).await
}

/// Seed the configured administrator when the store has no users at all.
/// Returns the new user, or `None` if nothing was seeded.
pub async fn bootstrap_admin<S: Store>(
  store: &S,
  cfg: &ServerConfig,
) -> Result<Option<Record<User>>, S::Error> {
  if store.count::<User>().await? > 0 {
    return Ok(None);
  }
  let Some(hash) = &cfg.admin_password_hash else {
    tracing::warn!(
      "no users exist and admin_password_hash is unset; every request will be refused"
    );
    return Ok(None);
  };

  let admin = store
    .create(User {
      username:          cfg.admin_username.clone(),
      password_hash:     hash.clone(),
      role:              Role::Admin,
      related_entity_id: None,
      is_active:         true,
    })
    .await?;
  tracing::info!(username = %admin.data.username, "seeded administrator");
  Ok(Some(admin))
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The complete application: the API under `/api`, with request tracing.
pub fn build_app<S>(store: Arc<S>) -> Router
where
  S: Store + 'static,
{
  Router::new()
    .nest("/api", redil_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
