pub mod game;
pub mod profile;
pub mod protocol;
pub mod shared;
pub mod sync;
pub mod transport;

use axum::{
  extract::{State, WebSocketUpgrade},
  http::Method,
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use sync::store::DocumentStore;
use transport::ws_session::{handle_socket, SyncState};

pub struct AppState {
  pub db: SqlitePool,
  pub sync: Arc<SyncState>,
}

impl AppState {
  pub fn new(db: SqlitePool) -> Self {
    Self {
      db,
      sync: Arc::new(SyncState::new(DocumentStore::new())),
    }
  }
}

pub fn build_router(state: Arc<AppState>) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::PUT])
    .allow_headers(Any);

  Router::new()
    .route("/api/health", get(health))
    .route("/api/players", post(profile::api::create_player))
    .route(
      "/api/players/:id",
      get(profile::api::get_player).put(profile::api::rename_player),
    )
    .route("/api/sessions", post(profile::api::record_session))
    .route("/api/sessions/player/:id", get(profile::api::player_sessions))
    .route("/api/leaderboard", get(profile::api::leaderboard))
    .route("/api/stats", get(profile::api::stats))
    .route("/api/sync", get(sync_handler))
    .layer(cors)
    .with_state(state)
}

async fn health() -> impl IntoResponse {
  Json(profile::api::OkResponse { ok: true })
}

async fn sync_handler(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
  let sync = state.sync.clone();
  ws.on_upgrade(move |socket| handle_socket(socket, sync))
}

pub fn ensure_db_dir(database_url: &str) -> anyhow::Result<()> {
  if database_url.starts_with("sqlite::memory:") {
    return Ok(());
  }
  let path = database_url
    .strip_prefix("sqlite://")
    .or_else(|| database_url.strip_prefix("sqlite:"));
  let Some(path) = path else { return Ok(()) };
  if path.is_empty() || path == ":memory:" {
    return Ok(());
  }
  let db_path = PathBuf::from(path);
  if let Some(parent) = db_path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  if !db_path.exists() {
    let _ = std::fs::File::create(&db_path)?;
  }
  Ok(())
}

pub fn current_time_millis() -> i64 {
  use std::time::{SystemTime, UNIX_EPOCH};
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}
