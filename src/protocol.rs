use crate::game::types::Mode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client sends over the sync websocket. Room commands manage the
/// lobby; the path-addressed commands read and write the shared document
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
  CreateRoom {
    name: String,
  },
  JoinRoom {
    room: String,
    name: String,
  },
  LeaveRoom {
    room: String,
    #[serde(rename = "playerId")]
    player_id: String,
  },
  SetMode {
    room: String,
    mode: Mode,
  },
  StartGame {
    room: String,
  },
  Subscribe {
    path: String,
  },
  Unsubscribe {
    path: String,
  },
  Set {
    path: String,
    value: Value,
  },
  Update {
    path: String,
    value: Value,
  },
  Remove {
    path: String,
  },
  Get {
    path: String,
  },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
  RoomCreated {
    room: String,
    #[serde(rename = "playerId")]
    player_id: String,
  },
  Joined {
    room: String,
    #[serde(rename = "playerId")]
    player_id: String,
  },
  Value {
    path: String,
    value: Value,
  },
  Error {
    error: String,
  },
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn client_messages_decode_from_tagged_json() {
    let message: ClientMessage =
      serde_json::from_value(json!({ "type": "createRoom", "name": "alice" })).expect("decode");
    assert_eq!(message, ClientMessage::CreateRoom { name: "alice".into() });

    let message: ClientMessage = serde_json::from_value(
      json!({ "type": "setMode", "room": "AB12CD", "mode": "arena" }),
    )
    .expect("decode");
    assert_eq!(
      message,
      ClientMessage::SetMode {
        room: "AB12CD".into(),
        mode: Mode::Arena,
      }
    );

    let message: ClientMessage = serde_json::from_value(
      json!({ "type": "set", "path": "rooms/AB12CD/positions/p1", "value": [{ "x": 1, "y": 2 }] }),
    )
    .expect("decode");
    match message {
      ClientMessage::Set { path, value } => {
        assert_eq!(path, "rooms/AB12CD/positions/p1");
        assert_eq!(value[0]["x"], json!(1));
      }
      other => panic!("unexpected message {other:?}"),
    }
  }

  #[test]
  fn server_messages_encode_with_camel_case_tags() {
    let encoded = serde_json::to_value(ServerMessage::RoomCreated {
      room: "AB12CD".into(),
      player_id: "p-1".into(),
    })
    .expect("encode");
    assert_eq!(
      encoded,
      json!({ "type": "roomCreated", "room": "AB12CD", "playerId": "p-1" })
    );

    let encoded = serde_json::to_value(ServerMessage::Value {
      path: "rooms/AB12CD/gameState".into(),
      value: json!({ "winner": "alice" }),
    })
    .expect("encode");
    assert_eq!(encoded["type"], json!("value"));
    assert_eq!(encoded["value"]["winner"], json!("alice"));
  }
}
