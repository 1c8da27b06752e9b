use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// One notification delivered to a subscriber: the current value at the
/// subscribed path after a write touched it (or `Null` when it was removed).
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
  pub path: String,
  pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
  segments: Vec<String>,
  path: String,
  tx: UnboundedSender<Snapshot>,
}

struct StoreInner {
  root: Value,
  subscribers: HashMap<SubscriptionId, Subscriber>,
  next_id: u64,
}

/// Shared hierarchical JSON document with path-addressed reads, last-writer-
/// wins writes and change subscriptions. Paths are slash-separated segments
/// (`rooms/AB12CD/positions/p1`). Clones share the same document.
#[derive(Clone)]
pub struct DocumentStore {
  inner: Arc<Mutex<StoreInner>>,
}

fn segments(path: &str) -> Vec<String> {
  path
    .split('/')
    .filter(|segment| !segment.is_empty())
    .map(str::to_owned)
    .collect()
}

fn value_at<'a>(root: &'a Value, segments: &[String]) -> &'a Value {
  let mut current = root;
  for segment in segments {
    match current.get(segment) {
      Some(child) => current = child,
      None => return &Value::Null,
    }
  }
  current
}

/// Descends to the parent of the addressed node, creating objects along the
/// way, and returns the parent map plus the final key.
fn parent_entry<'a>(
  root: &'a mut Value,
  segments: &[String],
) -> Option<(&'a mut Map<String, Value>, String)> {
  let (last, ancestors) = segments.split_last()?;
  let mut current = root;
  for segment in ancestors {
    if !current.is_object() {
      *current = Value::Object(Map::new());
    }
    current = current
      .as_object_mut()
      .expect("just coerced to object")
      .entry(segment.clone())
      .or_insert_with(|| Value::Object(Map::new()));
  }
  if !current.is_object() {
    *current = Value::Object(Map::new());
  }
  Some((current.as_object_mut().expect("coerced above"), last.clone()))
}

impl DocumentStore {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(StoreInner {
        root: Value::Object(Map::new()),
        subscribers: HashMap::new(),
        next_id: 0,
      })),
    }
  }

  pub fn get(&self, path: &str) -> Value {
    let inner = self.inner.lock().expect("store lock poisoned");
    value_at(&inner.root, &segments(path)).clone()
  }

  /// Replaces the subtree at `path`. Writing `Null` removes it; removing a
  /// path that does not exist is a no-op and creates no ancestors.
  pub fn set(&self, path: &str, value: Value) {
    let segments = segments(path);
    let mut inner = self.inner.lock().expect("store lock poisoned");
    if segments.is_empty() {
      inner.root = if value.is_null() {
        Value::Object(Map::new())
      } else {
        value
      };
    } else if value.is_null() {
      if !remove_at(&mut inner.root, &segments) {
        return;
      }
    } else if let Some((parent, key)) = parent_entry(&mut inner.root, &segments) {
      parent.insert(key, value);
    }
    notify(&mut inner, &segments);
  }

  /// Shallow-merges an object into the node at `path`; non-object existing
  /// values are replaced. `Null` entries in `value` delete their keys.
  pub fn update(&self, path: &str, value: Value) {
    let Value::Object(entries) = value else {
      self.set(path, value);
      return;
    };
    let segments = segments(path);
    let mut inner = self.inner.lock().expect("store lock poisoned");
    {
      let target = if segments.is_empty() {
        &mut inner.root
      } else {
        match parent_entry(&mut inner.root, &segments) {
          Some((parent, key)) => parent
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new())),
          None => return,
        }
      };
      if !target.is_object() {
        *target = Value::Object(Map::new());
      }
      let map = target.as_object_mut().expect("coerced above");
      for (key, entry) in entries {
        if entry.is_null() {
          map.remove(&key);
        } else {
          map.insert(key, entry);
        }
      }
    }
    notify(&mut inner, &segments);
  }

  pub fn remove(&self, path: &str) {
    self.set(path, Value::Null);
  }

  /// Registers a subscriber at `path`. The current value is delivered
  /// immediately, then again after every write that touches the path or any
  /// ancestor or descendant of it.
  pub fn subscribe(&self, path: &str) -> (SubscriptionId, UnboundedReceiver<Snapshot>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let segments = segments(path);
    let mut inner = self.inner.lock().expect("store lock poisoned");
    let id = SubscriptionId(inner.next_id);
    inner.next_id += 1;

    let initial = Snapshot {
      path: path.to_owned(),
      value: value_at(&inner.root, &segments).clone(),
    };
    let _ = tx.send(initial);

    inner.subscribers.insert(
      id,
      Subscriber {
        segments,
        path: path.to_owned(),
        tx,
      },
    );
    (id, rx)
  }

  pub fn unsubscribe(&self, id: SubscriptionId) {
    let mut inner = self.inner.lock().expect("store lock poisoned");
    inner.subscribers.remove(&id);
  }
}

impl Default for DocumentStore {
  fn default() -> Self {
    Self::new()
  }
}

/// Deletes the addressed node, descending through existing objects only.
/// Returns whether anything was actually removed.
fn remove_at(root: &mut Value, segments: &[String]) -> bool {
  let Some((last, ancestors)) = segments.split_last() else {
    return false;
  };
  let mut current = root;
  for segment in ancestors {
    match current.get_mut(segment) {
      Some(child) => current = child,
      None => return false,
    }
  }
  match current.as_object_mut() {
    Some(map) => map.remove(last).is_some(),
    None => false,
  }
}

fn overlaps(a: &[String], b: &[String]) -> bool {
  a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Fans the write out to every subscriber whose path shares a prefix with the
/// written path, in either direction. Dead receivers are dropped here.
fn notify(inner: &mut StoreInner, written: &[String]) {
  let mut dead = Vec::new();
  let mut deliveries = Vec::new();
  for (id, subscriber) in &inner.subscribers {
    if overlaps(&subscriber.segments, written) {
      deliveries.push((
        *id,
        Snapshot {
          path: subscriber.path.clone(),
          value: value_at(&inner.root, &subscriber.segments).clone(),
        },
      ));
    }
  }
  for (id, snapshot) in deliveries {
    let subscriber = &inner.subscribers[&id];
    if subscriber.tx.send(snapshot).is_err() {
      dead.push(id);
    }
  }
  for id in dead {
    inner.subscribers.remove(&id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn set_then_get_round_trips_by_path() {
    let store = DocumentStore::new();
    store.set("rooms/AB12CD/positions/p1", json!([{ "x": 5, "y": 10 }]));
    assert_eq!(
      store.get("rooms/AB12CD/positions/p1"),
      json!([{ "x": 5, "y": 10 }])
    );
    assert_eq!(store.get("rooms/AB12CD/positions/p2"), Value::Null);
  }

  #[test]
  fn last_writer_wins_on_the_same_path() {
    let store = DocumentStore::new();
    store.set("rooms/X/gameState/winner", json!("alice"));
    store.set("rooms/X/gameState/winner", json!("bob"));
    assert_eq!(store.get("rooms/X/gameState/winner"), json!("bob"));
  }

  #[test]
  fn update_merges_shallowly() {
    let store = DocumentStore::new();
    store.set("rooms/X", json!({ "status": "waiting", "gameMode": "classic" }));
    store.update("rooms/X", json!({ "status": "playing" }));
    assert_eq!(store.get("rooms/X/status"), json!("playing"));
    assert_eq!(store.get("rooms/X/gameMode"), json!("classic"));
  }

  #[test]
  fn subscriber_receives_initial_snapshot_then_changes() {
    let store = DocumentStore::new();
    store.set("rooms/X/status", json!("waiting"));
    let (_id, mut rx) = store.subscribe("rooms/X/status");

    let initial = rx.try_recv().expect("initial snapshot");
    assert_eq!(initial.value, json!("waiting"));

    store.set("rooms/X/status", json!("playing"));
    let change = rx.try_recv().expect("change snapshot");
    assert_eq!(change.value, json!("playing"));
  }

  #[test]
  fn descendant_write_notifies_ancestor_subscriber() {
    let store = DocumentStore::new();
    let (_id, mut rx) = store.subscribe("rooms/X");
    let _ = rx.try_recv();

    store.set("rooms/X/players/p1", json!({ "name": "alice" }));
    let snapshot = rx.try_recv().expect("ancestor notified");
    assert_eq!(
      snapshot.value,
      json!({ "players": { "p1": { "name": "alice" } } })
    );
  }

  #[test]
  fn ancestor_removal_delivers_null_to_descendant_subscriber() {
    let store = DocumentStore::new();
    store.set("rooms/X/gameState/food", json!([1, 2, 3]));
    let (_id, mut rx) = store.subscribe("rooms/X/gameState/food");
    let _ = rx.try_recv();

    store.remove("rooms/X");
    let snapshot = rx.try_recv().expect("removal notification");
    assert_eq!(snapshot.value, Value::Null);
  }

  #[test]
  fn sibling_writes_do_not_notify() {
    let store = DocumentStore::new();
    let (_id, mut rx) = store.subscribe("rooms/X/positions/p1");
    let _ = rx.try_recv();

    store.set("rooms/X/positions/p2", json!([{ "x": 1, "y": 1 }]));
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn unsubscribe_stops_delivery() {
    let store = DocumentStore::new();
    let (id, mut rx) = store.subscribe("rooms/X");
    let _ = rx.try_recv();
    store.unsubscribe(id);
    store.set("rooms/X/status", json!("playing"));
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn removing_a_missing_path_creates_nothing() {
    let store = DocumentStore::new();
    store.remove("rooms/NOPE99/players/ghost");
    assert_eq!(store.get("rooms/NOPE99"), Value::Null);
    assert_eq!(store.get("rooms"), Value::Null);

    store.set("rooms/NOPE99/players/ghost", Value::Null);
    assert_eq!(store.get("rooms"), Value::Null);
  }

  #[test]
  fn removal_under_a_missing_path_does_not_notify() {
    let store = DocumentStore::new();
    let (_id, mut rx) = store.subscribe("rooms/NOPE99");
    let _ = rx.try_recv();
    store.remove("rooms/NOPE99/players/ghost");
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn update_null_entry_deletes_the_key() {
    let store = DocumentStore::new();
    store.set("rooms/X", json!({ "winner": "alice", "status": "done" }));
    store.update("rooms/X", json!({ "winner": null }));
    assert_eq!(store.get("rooms/X/winner"), Value::Null);
    assert_eq!(store.get("rooms/X/status"), json!("done"));
  }
}
