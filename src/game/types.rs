use super::constants::{IMMORTAL_FOOD_VALUE, NORMAL_FOOD_VALUE, SPEED_FOOD_VALUE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
  pub x: i32,
  pub y: i32,
}

impl Position {
  pub fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl Direction {
  pub fn opposite(self) -> Direction {
    match self {
      Direction::Up => Direction::Down,
      Direction::Down => Direction::Up,
      Direction::Left => Direction::Right,
      Direction::Right => Direction::Left,
    }
  }

  pub fn delta(self) -> (i32, i32) {
    match self {
      Direction::Up => (0, -1),
      Direction::Down => (0, 1),
      Direction::Left => (-1, 0),
      Direction::Right => (1, 0),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  Classic,
  Speed,
  Walls,
  Portal,
  Arena,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Menu,
  Playing,
  Paused,
  GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
  Normal,
  Speed,
  Immortal,
}

impl FoodKind {
  pub fn value(self) -> i64 {
    match self {
      FoodKind::Normal => NORMAL_FOOD_VALUE,
      FoodKind::Speed => SPEED_FOOD_VALUE,
      FoodKind::Immortal => IMMORTAL_FOOD_VALUE,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Food {
  pub x: i32,
  pub y: i32,
  #[serde(rename = "type")]
  pub kind: FoodKind,
  pub value: i64,
}

impl Food {
  pub fn new(position: Position, kind: FoodKind) -> Self {
    Self {
      x: position.x,
      y: position.y,
      kind,
      value: kind.value(),
    }
  }

  pub fn position(&self) -> Position {
    Position::new(self.x, self.y)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
  pub entrance: Position,
  pub exit: Position,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Enemy {
  pub id: u32,
  pub x: i32,
  pub y: i32,
}

impl Enemy {
  pub fn position(&self) -> Position {
    Position::new(self.x, self.y)
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cannon {
  pub id: u32,
  pub x: i32,
  pub y: i32,
}

// Projectiles travel at sub-cell precision; the cell they occupy is the
// rounded coordinate pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Projectile {
  pub x: f64,
  pub y: f64,
  pub dx: f64,
  pub dy: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Particle {
  pub x: f64,
  pub y: f64,
  pub vx: f64,
  pub vy: f64,
  pub life: f64,
  pub size: f64,
}

/// Countdown timers for the two timed buffs. A zero counter means the buff
/// is inactive.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEffects {
  pub speed_boost: u32,
  pub immortal: u32,
}

impl StatusEffects {
  pub fn is_immortal(&self) -> bool {
    self.immortal > 0
  }

  pub fn is_boosted(&self) -> bool {
    self.speed_boost > 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn opposite_directions_pair_up() {
    assert_eq!(Direction::Up.opposite(), Direction::Down);
    assert_eq!(Direction::Left.opposite(), Direction::Right);
    assert_eq!(Direction::Right.opposite().opposite(), Direction::Right);
  }

  #[test]
  fn food_serializes_with_flat_coordinates() {
    let food = Food::new(Position::new(3, 4), FoodKind::Immortal);
    let json = serde_json::to_value(&food).expect("serialize food");
    assert_eq!(json["x"], 3);
    assert_eq!(json["type"], "immortal");
    assert_eq!(json["value"], 50);
  }

  #[test]
  fn direction_uses_upper_case_wire_names() {
    let json = serde_json::to_value(Direction::Left).expect("serialize direction");
    assert_eq!(json, "LEFT");
  }
}
