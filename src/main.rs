use snake_battle_backend::{build_router, ensure_db_dir, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let default_path = base.join("data").join("profiles.db");
    format!("sqlite://{}", default_path.display())
  });
  ensure_db_dir(&database_url)?;

  let db = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&database_url)
    .await?;
  sqlx::migrate!("./migrations").run(&db).await?;

  let state = Arc::new(AppState::new(db));
  let app = build_router(state);

  let port: u16 = env::var("PORT")
    .ok()
    .and_then(|value| value.parse().ok())
    .unwrap_or(8787);

  let address = format!("0.0.0.0:{port}");
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
