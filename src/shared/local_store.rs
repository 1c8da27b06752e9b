use std::fs;
use std::io;
use std::path::PathBuf;

const HIGH_SCORE_KEY: &str = "snakeHighScore";

/// Tiny file-backed key/value store for per-install scalars (the saved player
/// id, the local high score). One file per key under the data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
  dir: PathBuf,
}

fn safe_key(key: &str) -> String {
  key
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
    .collect()
}

impl LocalStore {
  pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir)?;
    Ok(Self { dir })
  }

  pub fn get(&self, key: &str) -> Option<String> {
    let contents = fs::read_to_string(self.dir.join(safe_key(key))).ok()?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
      None
    } else {
      Some(trimmed.to_owned())
    }
  }

  pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
    fs::write(self.dir.join(safe_key(key)), value)
  }

  pub fn remove(&self, key: &str) {
    let _ = fs::remove_file(self.dir.join(safe_key(key)));
  }

  /// Saved single-player high score; zero when absent or unreadable.
  pub fn high_score(&self) -> i64 {
    self
      .get(HIGH_SCORE_KEY)
      .and_then(|value| value.parse().ok())
      .unwrap_or(0)
  }

  /// Persists `score` when it beats the saved high score. Returns whether it
  /// was written.
  pub fn record_high_score(&self, score: i64) -> io::Result<bool> {
    if score <= self.high_score() {
      return Ok(false);
    }
    self.set(HIGH_SCORE_KEY, &score.to_string())?;
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> LocalStore {
    let dir = std::env::temp_dir().join(format!("local-store-{}", uuid::Uuid::new_v4()));
    LocalStore::new(dir).expect("store dir")
  }

  #[test]
  fn set_get_remove_round_trip() {
    let store = store();
    assert_eq!(store.get("playerId"), None);
    store.set("playerId", "p-123").expect("write");
    assert_eq!(store.get("playerId").as_deref(), Some("p-123"));
    store.remove("playerId");
    assert_eq!(store.get("playerId"), None);
  }

  #[test]
  fn keys_are_sanitized_to_filenames() {
    let store = store();
    store.set("weird/../key", "v").expect("write");
    assert_eq!(store.get("weird/../key").as_deref(), Some("v"));
  }

  #[test]
  fn high_score_only_moves_upward() {
    let store = store();
    assert_eq!(store.high_score(), 0);
    assert!(store.record_high_score(120).expect("write"));
    assert!(!store.record_high_score(80).expect("write"));
    assert_eq!(store.high_score(), 120);
  }

  /// A death that beats the saved high score is persisted, and the next game
  /// starts seeded with it.
  #[test]
  fn death_high_score_survives_across_games() {
    use crate::game::step::Game;
    use crate::game::types::{Mode, Position};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let store = store();
    let mut rng = StdRng::seed_from_u64(9);
    let mut game = Game::new();
    game.high_score = store.high_score();
    game.start(Mode::Classic, &mut rng);
    game.snake = vec![Position::new(19, 10)];
    game.score = 150;

    // Heading right off a lethal boundary.
    let events = game.frame(1000.0, &mut rng, None);
    let died = events.died.expect("death event");
    if let Some(high) = died.new_high_score {
      store.record_high_score(high).expect("persist");
    }

    let mut next = Game::new();
    next.high_score = store.high_score();
    assert_eq!(next.high_score, 150);
  }
}
