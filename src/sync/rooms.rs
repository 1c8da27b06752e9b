use super::store::DocumentStore;
use crate::game::constants::{MAX_ROOM_PLAYERS, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};
use crate::game::types::Mode;
use crate::shared::names::sanitize_player_name;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
  #[error("Room does not exist")]
  NotFound,
  #[error("Room is full")]
  Full,
  #[error("Game already in progress")]
  InProgress,
  #[error("Only the host can do this")]
  NotHost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
  Waiting,
  Playing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayer {
  pub id: String,
  pub name: String,
  pub is_host: bool,
  pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
  pub room_code: String,
  pub players: Vec<RoomPlayer>,
  pub status: RoomStatus,
  pub game_mode: Mode,
}

/// Lobby management layered over the shared document store. Each room lives
/// under `rooms/{code}`; mutations go through the store so every subscribed
/// client observes them.
#[derive(Clone)]
pub struct RoomService {
  store: DocumentStore,
}

fn room_path(code: &str) -> String {
  format!("rooms/{code}")
}

fn is_host(room: &Value, player_id: &str) -> bool {
  room
    .get("players")
    .and_then(Value::as_object)
    .and_then(|players| players.get(player_id))
    .and_then(|player| player.get("isHost"))
    .and_then(Value::as_bool)
    .unwrap_or(false)
}

pub fn generate_room_code(rng: &mut impl Rng) -> String {
  (0..ROOM_CODE_LENGTH)
    .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
    .collect()
}

impl RoomService {
  pub fn new(store: DocumentStore) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &DocumentStore {
    &self.store
  }

  /// Creates a room with the caller as host. Regenerates the code on the
  /// rare collision with a live room.
  pub fn create_room(&self, host_name: &str, rng: &mut impl Rng) -> (String, String) {
    let mut code = generate_room_code(rng);
    while !self.store.get(&room_path(&code)).is_null() {
      code = generate_room_code(rng);
    }
    let player_id = Uuid::new_v4().to_string();
    let name = sanitize_player_name(host_name, "Host");
    self.store.set(
      &room_path(&code),
      json!({
        "roomCode": &code,
        "players": {
          &player_id: { "id": &player_id, "name": name, "isHost": true, "score": 0 }
        },
        "status": "waiting",
        "gameMode": "classic",
      }),
    );
    tracing::info!(room = %code, "room created");
    (code, player_id)
  }

  /// Joins an existing room. Joining again under a name already present in
  /// the room reclaims that seat instead of consuming a new one.
  pub fn join_room(&self, code: &str, player_name: &str, rng: &mut impl Rng) -> Result<String, RoomError> {
    let room = self.store.get(&room_path(code));
    if room.is_null() {
      return Err(RoomError::NotFound);
    }
    if room.get("status").and_then(Value::as_str) == Some("playing") {
      return Err(RoomError::InProgress);
    }
    let name = sanitize_player_name(player_name, &crate::shared::names::guest_name(rng));

    let players = room.get("players").and_then(Value::as_object);
    if let Some(players) = players {
      if let Some((id, _)) = players
        .iter()
        .find(|(_, player)| player.get("name").and_then(Value::as_str) == Some(name.as_str()))
      {
        return Ok(id.clone());
      }
      if players.len() >= MAX_ROOM_PLAYERS {
        return Err(RoomError::Full);
      }
    }

    let player_id = Uuid::new_v4().to_string();
    self.store.set(
      &format!("rooms/{code}/players/{player_id}"),
      json!({ "id": &player_id, "name": name, "isHost": false, "score": 0 }),
    );
    Ok(player_id)
  }

  /// Removes a player. The last player out deletes the room; a departing
  /// host hands the seat to the remaining player.
  pub fn leave_room(&self, code: &str, player_id: &str) {
    let path = room_path(code);
    let room = self.store.get(&path);
    let Some(players) = room.get("players").and_then(Value::as_object) else {
      return;
    };
    let was_host = players
      .get(player_id)
      .and_then(|player| player.get("isHost"))
      .and_then(Value::as_bool)
      .unwrap_or(false);
    let remaining: Vec<&String> = players.keys().filter(|id| id.as_str() != player_id).collect();

    if remaining.is_empty() {
      self.store.remove(&path);
      tracing::info!(room = %code, "room closed");
      return;
    }
    self.store.remove(&format!("{path}/players/{player_id}"));
    if was_host {
      let heir = remaining[0].clone();
      self
        .store
        .update(&format!("{path}/players/{heir}"), json!({ "isHost": true }));
    }
  }

  /// Mode changes are a host call and only apply in the lobby; a running
  /// game keeps its mode.
  pub fn set_mode(&self, code: &str, player_id: &str, mode: Mode) -> Result<(), RoomError> {
    let room = self.store.get(&room_path(code));
    if room.is_null() {
      return Err(RoomError::NotFound);
    }
    if room.get("status").and_then(Value::as_str) == Some("playing") {
      return Err(RoomError::InProgress);
    }
    if !is_host(&room, player_id) {
      return Err(RoomError::NotHost);
    }
    self
      .store
      .update(&room_path(code), json!({ "gameMode": mode }));
    Ok(())
  }

  /// Only the host moves the room from waiting to playing.
  pub fn start_game(&self, code: &str, player_id: &str) -> Result<(), RoomError> {
    let room = self.store.get(&room_path(code));
    if room.is_null() {
      return Err(RoomError::NotFound);
    }
    if !is_host(&room, player_id) {
      return Err(RoomError::NotHost);
    }
    self
      .store
      .update(&room_path(code), json!({ "status": "playing" }));
    Ok(())
  }

  pub fn room(&self, code: &str) -> Result<RoomInfo, RoomError> {
    let room = self.store.get(&room_path(code));
    if room.is_null() {
      return Err(RoomError::NotFound);
    }
    let mut players: Vec<RoomPlayer> = room
      .get("players")
      .and_then(Value::as_object)
      .map(|players| {
        players
          .values()
          .filter_map(|player| serde_json::from_value(player.clone()).ok())
          .collect()
      })
      .unwrap_or_default();
    // Host first, then by name, so both clients render the same list.
    players.sort_by(|a, b| b.is_host.cmp(&a.is_host).then(a.name.cmp(&b.name)));

    let status = match room.get("status").and_then(Value::as_str) {
      Some("playing") => RoomStatus::Playing,
      _ => RoomStatus::Waiting,
    };
    let game_mode = room
      .get("gameMode")
      .cloned()
      .and_then(|mode| serde_json::from_value(mode).ok())
      .unwrap_or(Mode::Classic);

    Ok(RoomInfo {
      room_code: code.to_owned(),
      players,
      status,
      game_mode,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn service() -> (RoomService, StdRng) {
    (RoomService::new(DocumentStore::new()), StdRng::seed_from_u64(11))
  }

  #[test]
  fn room_codes_use_the_expected_alphabet() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..100 {
      let code = generate_room_code(&mut rng);
      assert_eq!(code.len(), 6);
      assert!(code
        .bytes()
        .all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit()));
    }
  }

  #[test]
  fn create_join_start_flow() {
    let (service, mut rng) = service();
    let (code, host_id) = service.create_room("alice", &mut rng);
    let guest_id = service.join_room(&code, "bob", &mut rng).expect("join");
    assert_ne!(host_id, guest_id);

    let info = service.room(&code).expect("room info");
    assert_eq!(info.players.len(), 2);
    assert!(info.players[0].is_host);
    assert_eq!(info.players[0].name, "alice");
    assert_eq!(info.status, RoomStatus::Waiting);

    service.set_mode(&code, &host_id, Mode::Arena).expect("set mode");
    service.start_game(&code, &host_id).expect("start");
    let info = service.room(&code).expect("room info");
    assert_eq!(info.status, RoomStatus::Playing);
    assert_eq!(info.game_mode, Mode::Arena);
    // The document itself carries its code.
    assert_eq!(
      service.store().get(&format!("rooms/{code}/roomCode")),
      serde_json::json!(code)
    );
  }

  #[test]
  fn only_the_host_changes_mode_or_starts() {
    let (service, mut rng) = service();
    let (code, host_id) = service.create_room("alice", &mut rng);
    let guest_id = service.join_room(&code, "bob", &mut rng).expect("join");

    assert_eq!(
      service.set_mode(&code, &guest_id, Mode::Speed),
      Err(RoomError::NotHost)
    );
    assert_eq!(
      service.start_game(&code, &guest_id),
      Err(RoomError::NotHost)
    );
    assert_eq!(service.room(&code).expect("info").status, RoomStatus::Waiting);

    service.start_game(&code, &host_id).expect("host starts");
  }

  #[test]
  fn join_rejects_missing_full_and_running_rooms() {
    let (service, mut rng) = service();
    assert_eq!(
      service.join_room("ZZZZZZ", "bob", &mut rng),
      Err(RoomError::NotFound)
    );

    let (code, host_id) = service.create_room("alice", &mut rng);
    service.join_room(&code, "bob", &mut rng).expect("join");
    assert_eq!(
      service.join_room(&code, "carol", &mut rng),
      Err(RoomError::Full)
    );

    service.start_game(&code, &host_id).expect("start");
    assert_eq!(
      service.join_room(&code, "dave", &mut rng),
      Err(RoomError::InProgress)
    );
    assert_eq!(
      service.set_mode(&code, &host_id, Mode::Speed),
      Err(RoomError::InProgress)
    );
  }

  #[test]
  fn stray_removal_does_not_materialize_a_room() {
    let (service, mut rng) = service();
    service.store().remove("rooms/NOPE99/players/ghost");
    assert_eq!(
      service.join_room("NOPE99", "bob", &mut rng),
      Err(RoomError::NotFound)
    );
    assert_eq!(service.room("NOPE99").unwrap_err(), RoomError::NotFound);
  }

  #[test]
  fn rejoining_under_the_same_name_reclaims_the_seat() {
    let (service, mut rng) = service();
    let (code, _) = service.create_room("alice", &mut rng);
    let first = service.join_room(&code, "bob", &mut rng).expect("join");
    let second = service.join_room(&code, "bob", &mut rng).expect("rejoin");
    assert_eq!(first, second);
    assert_eq!(service.room(&code).expect("info").players.len(), 2);
  }

  #[test]
  fn leaving_promotes_the_guest_and_empty_rooms_close() {
    let (service, mut rng) = service();
    let (code, host_id) = service.create_room("alice", &mut rng);
    let guest_id = service.join_room(&code, "bob", &mut rng).expect("join");

    service.leave_room(&code, &host_id);
    let info = service.room(&code).expect("info");
    assert_eq!(info.players.len(), 1);
    assert!(info.players[0].is_host);
    assert_eq!(info.players[0].name, "bob");

    service.leave_room(&code, &guest_id);
    assert_eq!(service.room(&code).unwrap_err(), RoomError::NotFound);
  }
}
