//! The Docket server: wires the SQLite store, on-disk attachments, JWT
//! credentials and the system clock into an [`Engine`], and serves the JSON
//! API over HTTP.

pub mod error;
pub mod files;
pub mod jwt;
pub mod settings;

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use axum::{Router, routing::get};
use docket_core::{
  clock::Clock,
  engine::Engine,
  storage::FileStorage,
  store::ComplianceStore,
};
use docket_store_sqlite::SqliteStore;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

use crate::{files::DiskFileStorage, jwt::JwtCredentials, settings::ServerConfig};

pub type ServerEngine = Engine<SqliteStore, DiskFileStorage>;

/// Open the store and file directory named by `cfg` and build an engine that
/// reads time from `clock`.
pub async fn build_engine(cfg: &ServerConfig, clock: Arc<dyn Clock>) -> anyhow::Result<ServerEngine> {
  let store_path = cfg.store_path();
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let file_dir = cfg.file_dir();
  let files = DiskFileStorage::open(&file_dir)
    .await
    .with_context(|| format!("failed to open file directory {file_dir:?}"))?;

  let credentials = JwtCredentials::new(
    cfg.jwt_secret.as_bytes(),
    chrono::Duration::seconds(i64::try_from(cfg.token_ttl_secs).context("token_ttl_secs too large")?),
  );

  Ok(Engine::new(Arc::new(store), Arc::new(files), Arc::new(credentials), clock))
}

/// The full HTTP application: the API under `/api`, a liveness probe, and
/// request tracing.
pub fn router<S, F>(engine: Arc<Engine<S, F>>) -> Router
where
  S: ComplianceStore + 'static,
  F: FileStorage + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", docket_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

/// Run the expiration sweep every `every`, starting immediately.
pub fn spawn_sweeper<S, F>(engine: Arc<Engine<S, F>>, every: Duration) -> JoinHandle<()>
where
  S: ComplianceStore + 'static,
  F: FileStorage + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      if let Err(e) = engine.sweep().await {
        tracing::warn!(error = %e, "expiration sweep failed");
      }
    }
  })
}
