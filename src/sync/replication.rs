use super::store::{DocumentStore, Snapshot, SubscriptionId};
use crate::game::constants::MATCH_DURATION_MS;
use crate::game::spawner::{self, ArenaLayout};
use crate::game::step::{Game, PlayerSlot, TickEvents};
use crate::game::types::{Direction, Food, Position};
use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedReceiver;

/// Locally mirrored view of the replicated match state. Updated by `pump`,
/// read by the simulation between ticks.
#[derive(Debug, Default)]
pub struct Mirror {
  pub opponent: Vec<Position>,
  pub food: Vec<Food>,
  pub scores: HashMap<String, i64>,
  pub winner: Option<String>,
  pub arena: Option<ArenaLayout>,
  pub started_at_ms: Option<f64>,
  pub room_closed: bool,
}

struct Feed {
  id: SubscriptionId,
  rx: UnboundedReceiver<Snapshot>,
  apply: fn(&mut Mirror, Value),
}

/// Connects one player's simulation to the shared document for a match.
/// Outbound writes happen on tick boundaries; inbound snapshots are drained
/// into the `Mirror` by `pump` once per frame.
pub struct ReplicationAdapter {
  store: DocumentStore,
  code: String,
  slot: PlayerSlot,
  player_name: String,
  opponent_name: String,
  pub mirror: Mirror,
  feeds: Vec<Feed>,
}

fn apply_opponent(mirror: &mut Mirror, value: Value) {
  mirror.opponent = serde_json::from_value(value).unwrap_or_default();
}

fn apply_game_state(mirror: &mut Mirror, value: Value) {
  mirror.food = value
    .get("food")
    .cloned()
    .and_then(|food| serde_json::from_value(food).ok())
    .unwrap_or_default();
  mirror.winner = value
    .get("winner")
    .and_then(Value::as_str)
    .map(str::to_owned);
  mirror.started_at_ms = value.get("startedAt").and_then(Value::as_f64);
}

fn apply_scores(mirror: &mut Mirror, value: Value) {
  mirror.scores = serde_json::from_value(value).unwrap_or_default();
}

fn apply_arena(mirror: &mut Mirror, value: Value) {
  mirror.arena = serde_json::from_value(value).ok();
}

fn apply_room(mirror: &mut Mirror, value: Value) {
  mirror.room_closed = value.is_null();
}

impl ReplicationAdapter {
  pub fn connect(
    store: DocumentStore,
    code: &str,
    slot: PlayerSlot,
    player_name: &str,
    opponent_name: &str,
  ) -> Self {
    let other = match slot {
      PlayerSlot::P1 => PlayerSlot::P2,
      PlayerSlot::P2 => PlayerSlot::P1,
    };
    let subscriptions: [(String, fn(&mut Mirror, Value)); 5] = [
      (
        format!("rooms/{code}/positions/{}", other.position_key()),
        apply_opponent,
      ),
      (format!("rooms/{code}/gameState"), apply_game_state),
      (format!("rooms/{code}/scores"), apply_scores),
      (format!("rooms/{code}/arena"), apply_arena),
      (format!("rooms/{code}"), apply_room),
    ];
    let feeds = subscriptions
      .into_iter()
      .map(|(path, apply)| {
        let (id, rx) = store.subscribe(&path);
        Feed { id, rx, apply }
      })
      .collect();

    Self {
      store,
      code: code.to_owned(),
      slot,
      player_name: player_name.to_owned(),
      opponent_name: opponent_name.to_owned(),
      mirror: Mirror::default(),
      feeds,
    }
  }

  /// Host-only match seeding: initial food, the match clock, zeroed scores
  /// and (for arena) the hazard layout, written once before play begins.
  pub fn seed_host(&self, game: &Game, now_ms: f64, rng: &mut impl Rng) {
    let code = &self.code;
    let mut food: Vec<Food> = Vec::new();
    spawner::fill_food(
      rng,
      &mut food,
      game.rules.food_target,
      game.rules.weights,
      game.rules.grid,
      &game.snake,
      &[],
    );
    self.store.set(
      &format!("rooms/{code}/gameState"),
      json!({ "food": food, "startedAt": now_ms }),
    );
    self.store.set(
      &format!("rooms/{code}/scores"),
      json!({ &self.player_name: 0, &self.opponent_name: 0 }),
    );
    if game.rules.has_arena_hazards() {
      let layout = spawner::generate_net_arena(rng, game.rules.grid);
      self
        .store
        .set(&format!("rooms/{code}/arena"), json!(layout));
    }
  }

  /// Drains every feed, folding the latest snapshots into the mirror.
  pub fn pump(&mut self) {
    for feed in &mut self.feeds {
      while let Ok(snapshot) = feed.rx.try_recv() {
        (feed.apply)(&mut self.mirror, snapshot.value);
      }
    }
  }

  /// Publishes this tick's outcome: the body every move, plus the replaced
  /// food item and new score when something was eaten. The eater picks the
  /// replacement so both sides converge on the same food list.
  pub fn after_tick(&self, game: &Game, events: &TickEvents, rng: &mut impl Rng) {
    let code = &self.code;
    if events.moved {
      self.store.set(
        &format!("rooms/{code}/positions/{}", self.slot.position_key()),
        json!(game.snake),
      );
    }
    if let Some((index, _)) = events.ate {
      let occupied: Vec<Position> = self.mirror.food.iter().map(Food::position).collect();
      let position = spawner::place_random(rng, game.rules.grid, &occupied, &[]);
      let replacement = Food::new(position, game.rules.weights.pick(rng));
      let mut food = self.mirror.food.clone();
      if index < food.len() {
        food[index] = replacement;
      } else {
        food.push(replacement);
      }
      self
        .store
        .set(&format!("rooms/{code}/gameState/food"), json!(food));
      self.store.set(
        &format!("rooms/{code}/scores/{}", self.player_name),
        json!(game.score),
      );
    }
  }

  /// Mirrors a local input so the other side can echo intent immediately
  /// instead of waiting for the next position write.
  pub fn on_direction_change(&self, direction: Direction, timestamp_ms: f64) {
    self.store.set(
      &format!("rooms/{}/moves/{}", self.code, self.player_name),
      json!({ "direction": direction, "timestamp": timestamp_ms }),
    );
  }

  /// A local death concedes the match to the opponent.
  pub fn on_death(&self) {
    self.store.set(
      &format!("rooms/{}/gameState/winner", self.code),
      json!(self.opponent_name),
    );
  }

  /// After the match clock runs out the higher score wins; equal scores tie.
  /// Returns the published verdict, if the timer has expired.
  pub fn check_timer(&self, now_ms: f64, my_score: i64) -> Option<String> {
    let started = self.mirror.started_at_ms?;
    if now_ms - started < MATCH_DURATION_MS {
      return None;
    }
    let theirs = self
      .mirror
      .scores
      .get(&self.opponent_name)
      .copied()
      .unwrap_or(0);
    let verdict = if my_score > theirs {
      self.player_name.clone()
    } else if theirs > my_score {
      self.opponent_name.clone()
    } else {
      "Tie".to_owned()
    };
    self.store.set(
      &format!("rooms/{}/gameState/winner", self.code),
      json!(&verdict),
    );
    Some(verdict)
  }

  pub fn disconnect(&mut self) {
    for feed in self.feeds.drain(..) {
      self.store.unsubscribe(feed.id);
    }
  }
}

impl Drop for ReplicationAdapter {
  fn drop(&mut self) {
    self.disconnect();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::types::Mode;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn match_pair(mode: Mode) -> (DocumentStore, ReplicationAdapter, ReplicationAdapter, Game, Game) {
    let store = DocumentStore::new();
    let host = ReplicationAdapter::connect(store.clone(), "AB12CD", PlayerSlot::P1, "alice", "bob");
    let guest = ReplicationAdapter::connect(store.clone(), "AB12CD", PlayerSlot::P2, "bob", "alice");
    let mut p1 = Game::new();
    p1.start_networked(mode, PlayerSlot::P1);
    let mut p2 = Game::new();
    p2.start_networked(mode, PlayerSlot::P2);
    (store, host, guest, p1, p2)
  }

  #[test]
  fn host_seeding_reaches_the_guest_mirror() {
    let mut rng = StdRng::seed_from_u64(21);
    let (_store, host, mut guest, p1, _p2) = match_pair(Mode::Classic);

    host.seed_host(&p1, 1000.0, &mut rng);
    guest.pump();

    assert_eq!(guest.mirror.food.len(), p1.rules.food_target);
    assert_eq!(guest.mirror.started_at_ms, Some(1000.0));
    assert_eq!(guest.mirror.scores.get("alice"), Some(&0));
  }

  #[test]
  fn arena_layout_is_seeded_once_for_both_sides() {
    let mut rng = StdRng::seed_from_u64(22);
    let (_store, host, mut guest, p1, _p2) = match_pair(Mode::Arena);

    host.seed_host(&p1, 0.0, &mut rng);
    guest.pump();

    let layout = guest.mirror.arena.as_ref().expect("arena layout");
    assert_eq!(layout.walls.len(), 300);
    assert_eq!(layout.enemies.len(), 20);
  }

  #[test]
  fn position_writes_mirror_to_the_opponent() {
    let mut rng = StdRng::seed_from_u64(23);
    let (_store, host, mut guest, p1, _p2) = match_pair(Mode::Classic);

    let events = TickEvents {
      moved: true,
      ..Default::default()
    };
    host.after_tick(&p1, &events, &mut rng);
    guest.pump();

    assert_eq!(guest.mirror.opponent, p1.snake);
  }

  #[test]
  fn eating_replaces_the_shared_food_item_and_score() {
    let mut rng = StdRng::seed_from_u64(24);
    let (_store, mut host, mut guest, mut p1, _p2) = match_pair(Mode::Classic);
    host.seed_host(&p1, 0.0, &mut rng);
    host.pump();

    p1.score = 10;
    let eaten = Food::new(Position::new(3, 3), crate::game::types::FoodKind::Normal);
    let events = TickEvents {
      moved: true,
      ate: Some((0, eaten)),
      ..Default::default()
    };
    host.after_tick(&p1, &events, &mut rng);
    guest.pump();

    assert_eq!(guest.mirror.food.len(), p1.rules.food_target);
    assert_eq!(guest.mirror.scores.get("alice"), Some(&10));
  }

  #[test]
  fn death_publishes_the_opponent_as_winner() {
    let (_store, host, mut guest, _p1, _p2) = match_pair(Mode::Classic);
    host.on_death();
    guest.pump();
    assert_eq!(guest.mirror.winner.as_deref(), Some("bob"));
  }

  #[test]
  fn expired_timer_awards_the_higher_score_or_ties() {
    let mut rng = StdRng::seed_from_u64(25);
    let (_store, mut host, mut guest, p1, _p2) = match_pair(Mode::Classic);
    host.seed_host(&p1, 0.0, &mut rng);
    host.pump();

    assert_eq!(host.check_timer(1000.0, 50), None);

    host.mirror.scores.insert("bob".to_owned(), 30);
    assert_eq!(
      host.check_timer(MATCH_DURATION_MS, 50).as_deref(),
      Some("alice")
    );

    host.mirror.scores.insert("bob".to_owned(), 50);
    assert_eq!(
      host.check_timer(MATCH_DURATION_MS, 50).as_deref(),
      Some("Tie")
    );
    guest.pump();
    assert_eq!(guest.mirror.winner.as_deref(), Some("Tie"));
  }

  #[test]
  fn room_deletion_flags_the_mirror_closed() {
    let (store, _host, mut guest, _p1, _p2) = match_pair(Mode::Classic);
    store.set("rooms/AB12CD", serde_json::json!({ "status": "playing" }));
    guest.pump();
    assert!(!guest.mirror.room_closed);

    store.remove("rooms/AB12CD");
    guest.pump();
    assert!(guest.mirror.room_closed);
  }

  #[test]
  fn direction_changes_land_under_moves() {
    let (store, host, _guest, _p1, _p2) = match_pair(Mode::Classic);
    host.on_direction_change(Direction::Up, 42.0);
    let value = store.get("rooms/AB12CD/moves/alice");
    assert_eq!(value.get("direction"), Some(&serde_json::json!("UP")));
  }
}
