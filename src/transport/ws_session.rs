use crate::protocol::{ClientMessage, ServerMessage};
use crate::sync::rooms::RoomService;
use crate::sync::store::{DocumentStore, SubscriptionId};
use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Shared state of the sync endpoint: the document, the lobby layer over it,
/// and the live sessions so a drop can be cleaned up.
pub struct SyncState {
  pub store: DocumentStore,
  pub rooms: RoomService,
  pub sessions: DashMap<Uuid, SessionSeat>,
}

/// Lobby seat a session occupies, released when the socket closes.
#[derive(Debug, Clone, Default)]
pub struct SessionSeat {
  pub room: Option<String>,
  pub player_id: Option<String>,
}

impl SyncState {
  pub fn new(store: DocumentStore) -> Self {
    Self {
      rooms: RoomService::new(store.clone()),
      store,
      sessions: DashMap::new(),
    }
  }
}

struct Subscription {
  id: SubscriptionId,
  forward: JoinHandle<()>,
}

pub async fn handle_socket(socket: WebSocket, state: Arc<SyncState>) {
  let session_id = Uuid::new_v4();
  state.sessions.insert(session_id, SessionSeat::default());
  tracing::debug!(%session_id, "sync session opened");

  let (mut sink, mut inbound) = socket.split();
  let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

  let send_task = tokio::spawn(async move {
    while let Some(message) = rx.recv().await {
      let Ok(text) = serde_json::to_string(&message) else {
        continue;
      };
      if sink.send(Message::Text(text)).await.is_err() {
        return;
      }
    }
  });

  let mut subscriptions: HashMap<String, Subscription> = HashMap::new();

  while let Some(result) = inbound.next().await {
    let Ok(message) = result else { break };
    match message {
      Message::Text(text) => {
        let parsed = serde_json::from_str::<ClientMessage>(&text);
        match parsed {
          Ok(message) => {
            handle_message(&state, session_id, message, &tx, &mut subscriptions);
          }
          Err(error) => {
            let _ = tx.send(ServerMessage::Error {
              error: format!("malformed message: {error}"),
            });
          }
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }

  for (_, subscription) in subscriptions.drain() {
    state.store.unsubscribe(subscription.id);
    subscription.forward.abort();
  }
  if let Some((_, seat)) = state.sessions.remove(&session_id) {
    if let (Some(room), Some(player_id)) = (seat.room, seat.player_id) {
      state.rooms.leave_room(&room, &player_id);
    }
  }
  send_task.abort();
  tracing::debug!(%session_id, "sync session closed");
}

fn handle_message(
  state: &Arc<SyncState>,
  session_id: Uuid,
  message: ClientMessage,
  tx: &mpsc::UnboundedSender<ServerMessage>,
  subscriptions: &mut HashMap<String, Subscription>,
) {
  match message {
    ClientMessage::CreateRoom { name } => {
      let (room, player_id) = {
        let mut rng = rand::thread_rng();
        state.rooms.create_room(&name, &mut rng)
      };
      take_seat(state, session_id, &room, &player_id);
      let _ = tx.send(ServerMessage::RoomCreated { room, player_id });
    }
    ClientMessage::JoinRoom { room, name } => {
      let joined = {
        let mut rng = rand::thread_rng();
        state.rooms.join_room(&room, &name, &mut rng)
      };
      match joined {
        Ok(player_id) => {
          take_seat(state, session_id, &room, &player_id);
          let _ = tx.send(ServerMessage::Joined { room, player_id });
        }
        Err(error) => {
          let _ = tx.send(ServerMessage::Error {
            error: error.to_string(),
          });
        }
      }
    }
    ClientMessage::LeaveRoom { room, player_id } => {
      state.rooms.leave_room(&room, &player_id);
      if let Some(mut seat) = state.sessions.get_mut(&session_id) {
        seat.room = None;
        seat.player_id = None;
      }
    }
    ClientMessage::SetMode { room, mode } => {
      let Some(player_id) = seat_player(state, session_id) else {
        let _ = tx.send(ServerMessage::Error {
          error: "Not in a room".to_string(),
        });
        return;
      };
      if let Err(error) = state.rooms.set_mode(&room, &player_id, mode) {
        let _ = tx.send(ServerMessage::Error {
          error: error.to_string(),
        });
      }
    }
    ClientMessage::StartGame { room } => {
      let Some(player_id) = seat_player(state, session_id) else {
        let _ = tx.send(ServerMessage::Error {
          error: "Not in a room".to_string(),
        });
        return;
      };
      if let Err(error) = state.rooms.start_game(&room, &player_id) {
        let _ = tx.send(ServerMessage::Error {
          error: error.to_string(),
        });
      }
    }
    ClientMessage::Subscribe { path } => {
      if subscriptions.contains_key(&path) {
        return;
      }
      let (id, mut feed) = state.store.subscribe(&path);
      let forward_tx = tx.clone();
      let forward = tokio::spawn(async move {
        while let Some(snapshot) = feed.recv().await {
          let sent = forward_tx.send(ServerMessage::Value {
            path: snapshot.path,
            value: snapshot.value,
          });
          if sent.is_err() {
            return;
          }
        }
      });
      subscriptions.insert(path, Subscription { id, forward });
    }
    ClientMessage::Unsubscribe { path } => {
      if let Some(subscription) = subscriptions.remove(&path) {
        state.store.unsubscribe(subscription.id);
        subscription.forward.abort();
      }
    }
    ClientMessage::Set { path, value } => state.store.set(&path, value),
    ClientMessage::Update { path, value } => state.store.update(&path, value),
    ClientMessage::Remove { path } => state.store.remove(&path),
    ClientMessage::Get { path } => {
      let value = state.store.get(&path);
      let _ = tx.send(ServerMessage::Value { path, value });
    }
  }
}

fn seat_player(state: &Arc<SyncState>, session_id: Uuid) -> Option<String> {
  state
    .sessions
    .get(&session_id)
    .and_then(|seat| seat.player_id.clone())
}

fn take_seat(state: &Arc<SyncState>, session_id: Uuid, room: &str, player_id: &str) {
  if let Some(mut seat) = state.sessions.get_mut(&session_id) {
    seat.room = Some(room.to_owned());
    seat.player_id = Some(player_id.to_owned());
  }
}
