use crate::shared::names::sanitize_player_name;
use crate::AppState;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use sqlx::Row;

const MAX_SCORE: i64 = 1_000_000;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct OkResponse {
  pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub ok: bool,
  pub error: String,
}

fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
  (
    status,
    Json(ErrorResponse {
      ok: false,
      error: error.to_string(),
    }),
  )
    .into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerProfile {
  id: String,
  name: String,
  created_at: i64,
  games_played: i64,
  high_score: i64,
  total_score: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlayerPayload {
  name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
  player_id: Option<String>,
  mode: Option<String>,
  score: Option<f64>,
  duration_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
  id: String,
  player_id: String,
  mode: String,
  score: i64,
  duration_ms: i64,
  created_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardEntry {
  name: String,
  high_score: i64,
  games_played: i64,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
  scores: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
  players: i64,
  sessions: i64,
  total_score: i64,
  top_score: i64,
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Option<PlayerProfile> {
  Some(PlayerProfile {
    id: row.try_get("id").ok()?,
    name: row.try_get("name").ok()?,
    created_at: row.try_get("created_at").ok()?,
    games_played: row.try_get("games_played").ok()?,
    high_score: row.try_get("high_score").ok()?,
    total_score: row.try_get("total_score").ok()?,
  })
}

pub async fn create_player(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<PlayerPayload>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(payload)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
  };
  let raw_name = payload.name.unwrap_or_else(|| "Player".to_string());
  let name = sanitize_player_name(&raw_name, "Player");
  let id = uuid::Uuid::new_v4().to_string();
  let created_at = crate::current_time_millis();

  let result = sqlx::query(
    "INSERT INTO players (id, name, created_at, games_played, high_score, total_score) \
     VALUES (?, ?, ?, 0, 0, 0)",
  )
  .bind(&id)
  .bind(&name)
  .bind(created_at)
  .execute(&state.db)
  .await;

  if result.is_err() {
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create player");
  }
  tracing::info!(player = %id, "player created");
  (
    StatusCode::OK,
    Json(PlayerProfile {
      id,
      name,
      created_at,
      games_played: 0,
      high_score: 0,
      total_score: 0,
    }),
  )
    .into_response()
}

pub async fn get_player(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  let row = sqlx::query("SELECT * FROM players WHERE id = ?")
    .bind(&id)
    .fetch_optional(&state.db)
    .await;
  match row {
    Ok(Some(row)) => match row_to_profile(&row) {
      Some(profile) => (StatusCode::OK, Json(profile)).into_response(),
      None => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt player row"),
    },
    Ok(None) => error_response(StatusCode::NOT_FOUND, "Player not found"),
    Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load player"),
  }
}

pub async fn rename_player(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  payload: Result<Json<PlayerPayload>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(payload)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
  };
  let Some(raw_name) = payload.name else {
    return error_response(StatusCode::BAD_REQUEST, "Name is required");
  };
  let name = sanitize_player_name(&raw_name, "Player");

  let result = sqlx::query("UPDATE players SET name = ? WHERE id = ?")
    .bind(&name)
    .bind(&id)
    .execute(&state.db)
    .await;
  match result {
    Ok(outcome) if outcome.rows_affected() == 0 => {
      error_response(StatusCode::NOT_FOUND, "Player not found")
    }
    Ok(_) => (StatusCode::OK, Json(OkResponse { ok: true })).into_response(),
    Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to rename player"),
  }
}

/// Records a finished game and folds it into the player's aggregates in one
/// transaction.
pub async fn record_session(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<SessionPayload>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(payload)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
  };
  let Some(player_id) = payload.player_id else {
    return error_response(StatusCode::BAD_REQUEST, "playerId is required");
  };
  let mode = payload.mode.unwrap_or_else(|| "classic".to_string());
  let score_value = payload.score.unwrap_or(f64::NAN);
  if !score_value.is_finite() {
    return error_response(StatusCode::BAD_REQUEST, "Score must be a number");
  }
  let score = score_value.floor() as i64;
  if score < 0 || score > MAX_SCORE {
    return error_response(StatusCode::BAD_REQUEST, "Score out of range");
  }
  let duration_ms = payload.duration_ms.unwrap_or(0).max(0);
  let id = uuid::Uuid::new_v4().to_string();
  let created_at = crate::current_time_millis();

  let mut tx = match state.db.begin().await {
    Ok(tx) => tx,
    Err(_) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Submission failed"),
  };

  let inserted = sqlx::query(
    "INSERT INTO game_sessions (id, player_id, mode, score, duration_ms, created_at) \
     VALUES (?, ?, ?, ?, ?, ?)",
  )
  .bind(&id)
  .bind(&player_id)
  .bind(&mode)
  .bind(score)
  .bind(duration_ms)
  .bind(created_at)
  .execute(&mut *tx)
  .await;
  if inserted.is_err() {
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Submission failed");
  }

  let updated = sqlx::query(
    "UPDATE players SET games_played = games_played + 1, \
     total_score = total_score + ?, \
     high_score = MAX(high_score, ?) WHERE id = ?",
  )
  .bind(score)
  .bind(score)
  .bind(&player_id)
  .execute(&mut *tx)
  .await;
  match updated {
    Ok(outcome) if outcome.rows_affected() == 0 => {
      return error_response(StatusCode::NOT_FOUND, "Player not found");
    }
    Ok(_) => {}
    Err(_) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Submission failed"),
  }

  if tx.commit().await.is_err() {
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Submission failed");
  }
  (StatusCode::OK, Json(OkResponse { ok: true })).into_response()
}

pub async fn player_sessions(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  let rows = sqlx::query(
    "SELECT id, player_id, mode, score, duration_ms, created_at FROM game_sessions \
     WHERE player_id = ? ORDER BY created_at DESC",
  )
  .bind(&id)
  .fetch_all(&state.db)
  .await;
  let rows = match rows {
    Ok(rows) => rows,
    Err(_) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load sessions"),
  };
  let sessions = rows
    .into_iter()
    .filter_map(|row| {
      Some(SessionRecord {
        id: row.try_get("id").ok()?,
        player_id: row.try_get("player_id").ok()?,
        mode: row.try_get("mode").ok()?,
        score: row.try_get("score").ok()?,
        duration_ms: row.try_get("duration_ms").ok()?,
        created_at: row.try_get("created_at").ok()?,
      })
    })
    .collect::<Vec<_>>();
  (StatusCode::OK, Json(sessions)).into_response()
}

pub async fn leaderboard(
  State(state): State<Arc<AppState>>,
  Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
  let limit = params
    .get("limit")
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(DEFAULT_LIMIT)
    .clamp(1, MAX_LIMIT);

  let rows = sqlx::query(
    "SELECT name, high_score, games_played FROM players \
     WHERE games_played > 0 ORDER BY high_score DESC, created_at ASC LIMIT ?",
  )
  .bind(limit)
  .fetch_all(&state.db)
  .await;
  let rows = match rows {
    Ok(rows) => rows,
    Err(_) => {
      return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
    }
  };
  let scores = rows
    .into_iter()
    .filter_map(|row| {
      Some(LeaderboardEntry {
        name: row.try_get("name").ok()?,
        high_score: row.try_get("high_score").ok()?,
        games_played: row.try_get("games_played").ok()?,
      })
    })
    .collect::<Vec<_>>();
  (StatusCode::OK, Json(LeaderboardResponse { scores })).into_response()
}

pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let row = sqlx::query(
    "SELECT (SELECT COUNT(*) FROM players) AS players, \
     (SELECT COUNT(*) FROM game_sessions) AS sessions, \
     (SELECT COALESCE(SUM(score), 0) FROM game_sessions) AS total_score, \
     (SELECT COALESCE(MAX(high_score), 0) FROM players) AS top_score",
  )
  .fetch_one(&state.db)
  .await;
  match row {
    Ok(row) => {
      let response = StatsResponse {
        players: row.try_get("players").unwrap_or(0),
        sessions: row.try_get("sessions").unwrap_or(0),
        total_score: row.try_get("total_score").unwrap_or(0),
        top_score: row.try_get("top_score").unwrap_or(0),
      };
      (StatusCode::OK, Json(response)).into_response()
    }
    Err(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load stats"),
  }
}
