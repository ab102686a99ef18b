//! Bootstrapping for the Accolade HTTP server.
//!
//! Opens the two databases, wires them into a [`Lifecycle`] and wraps the
//! JSON API in request tracing. `main.rs` only handles the CLI, logging and
//! configuration loading.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use accolade_core::{Lifecycle, LifecycleConfig};
use accolade_store_sqlite::{DocumentStore, SqliteStore};

/// The coordinator as wired by this server.
pub type AppLifecycle = Lifecycle<DocumentStore, SqliteStore, SqliteStore>;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ACCOLADE_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  /// Relational database holding reference rows and the directory tables.
  pub reference_db_path: PathBuf,
  /// Document database holding achievement content.
  pub content_db_path:   PathBuf,
  #[serde(default = "default_store_timeout_ms")]
  pub store_timeout_ms:  u64,
  #[serde(default = "default_page_size")]
  pub default_page_size: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_timeout_ms() -> u64 { 5000 }
fn default_page_size() -> u64 { 10 }

impl ServerConfig {
  pub fn lifecycle_config(&self) -> LifecycleConfig {
    LifecycleConfig {
      store_timeout:     Duration::from_millis(self.store_timeout_ms),
      default_page_size: self.default_page_size.max(1),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

/// Open both stores named in `config` and build the coordinator over them.
pub async fn open_lifecycle(config: &ServerConfig) -> anyhow::Result<AppLifecycle> {
  let reference_path = expand_tilde(&config.reference_db_path);
  let references = SqliteStore::open(&reference_path)
    .await
    .with_context(|| format!("failed to open reference store at {reference_path:?}"))?;

  let content_path = expand_tilde(&config.content_db_path);
  let content = DocumentStore::open(&content_path)
    .await
    .with_context(|| format!("failed to open content store at {content_path:?}"))?;

  let references = Arc::new(references);
  Ok(Lifecycle::new(
    Arc::new(content),
    references.clone(),
    references,
    config.lifecycle_config(),
  ))
}

/// The full application: the API router with request tracing.
pub fn router(lifecycle: Arc<AppLifecycle>) -> Router {
  accolade_api::api_router(lifecycle).layer(TraceLayer::new_for_http())
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

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_fill_optional_fields() {
    let cfg = parse(
      r#"
        reference_db_path = "refs.db"
        content_db_path   = "content.db"
      "#,
    );
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.lifecycle_config(), LifecycleConfig::default());
  }

  #[test]
  fn explicit_values_override_defaults() {
    let cfg = parse(
      r#"
        host              = "0.0.0.0"
        port              = 9000
        reference_db_path = "refs.db"
        content_db_path   = "content.db"
        store_timeout_ms  = 250
        default_page_size = 0
      "#,
    );
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    let lc = cfg.lifecycle_config();
    assert_eq!(lc.store_timeout, Duration::from_millis(250));
    assert_eq!(lc.default_page_size, 1);
  }

  #[test]
  fn tilde_expansion() {
    let expanded = expand_tilde(Path::new("~/accolade/refs.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("accolade/refs.db"));
    }
    assert_eq!(expand_tilde(Path::new("/srv/refs.db")), PathBuf::from("/srv/refs.db"));
  }

  #[tokio::test]
  async fn serves_api_over_in_memory_stores() {
    let cfg = parse(
      r#"
        reference_db_path = ":memory:"
        content_db_path   = ":memory:"
      "#,
    );
    let lifecycle = Arc::new(open_lifecycle(&cfg).await.unwrap());
    let req = Request::builder()
      .uri("/achievements")
      .body(Body::empty())
      .unwrap();
    let res = router(lifecycle).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }
}
