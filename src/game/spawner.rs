use super::constants::{
  ARENA_CANNON_COUNT, ARENA_ENEMY_COUNT, ARENA_GRID_SIZE, ARENA_WALL_SEGMENTS,
  MAX_PLACE_ATTEMPTS, NET_ARENA_WALL_CELLS,
};
use super::mode::SpawnWeights;
use super::types::{Cannon, Enemy, Food, Portal, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Uniform draw from the grid, retrying while the candidate coincides with an
/// avoided cell or a wall. After the attempt budget runs out the last
/// candidate is returned regardless; a rare overlap is preferable to an
/// unbounded loop on a crowded grid.
pub fn place_random(
  rng: &mut impl Rng,
  grid: i32,
  avoid: &[Position],
  walls: &[Position],
) -> Position {
  let mut candidate = Position::new(rng.gen_range(0..grid), rng.gen_range(0..grid));
  for _ in 1..MAX_PLACE_ATTEMPTS {
    let occupied =
      avoid.contains(&candidate) || walls.iter().any(|wall| *wall == candidate);
    if !occupied {
      break;
    }
    candidate = Position::new(rng.gen_range(0..grid), rng.gen_range(0..grid));
  }
  candidate
}

/// Tops the food list up to `target`; a no-op when already at or above it.
pub fn fill_food(
  rng: &mut impl Rng,
  food: &mut Vec<Food>,
  target: usize,
  weights: SpawnWeights,
  grid: i32,
  avoid: &[Position],
  walls: &[Position],
) {
  while food.len() < target {
    let mut occupied: Vec<Position> = avoid.to_vec();
    occupied.extend(food.iter().map(Food::position));
    let position = place_random(rng, grid, &occupied, walls);
    let kind = weights.pick(rng);
    food.push(Food::new(position, kind));
  }
}

/// Walls-mode layout: `5 + level / 2` short segments, random orientation,
/// clipped to the grid. Density scales with level.
pub fn generate_walls(
  rng: &mut impl Rng,
  level: u32,
  grid: i32,
  avoid: &[Position],
) -> Vec<Position> {
  let segment_count = 5 + level as usize / 2;
  let mut walls: Vec<Position> = Vec::new();
  for _ in 0..segment_count {
    let length = rng.gen_range(2..=5);
    let horizontal = rng.gen_bool(0.5);
    let start = place_random(rng, grid, avoid, &walls);
    for offset in 0..length {
      let cell = if horizontal {
        Position::new(start.x + offset, start.y)
      } else {
        Position::new(start.x, start.y + offset)
      };
      if cell.x >= 0 && cell.x < grid && cell.y >= 0 && cell.y < grid {
        walls.push(cell);
      }
    }
  }
  walls
}

/// Portal-mode layout: `2 + level / 3` entrance/exit pairs, each endpoint
/// avoiding the snake, walls and every previously placed endpoint.
pub fn generate_portals(
  rng: &mut impl Rng,
  level: u32,
  grid: i32,
  avoid: &[Position],
  walls: &[Position],
) -> Vec<Portal> {
  let pair_count = 2 + level as usize / 3;
  let mut portals: Vec<Portal> = Vec::new();
  for _ in 0..pair_count {
    let mut occupied: Vec<Position> = avoid.to_vec();
    for portal in &portals {
      occupied.push(portal.entrance);
      occupied.push(portal.exit);
    }
    let entrance = place_random(rng, grid, &occupied, walls);
    occupied.push(entrance);
    let exit = place_random(rng, grid, &occupied, walls);
    portals.push(Portal { entrance, exit });
  }
  portals
}

/// Host-seeded or single-player arena layout. Replicated as one document in
/// two-player games, so it carries serde derives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArenaLayout {
  pub walls: Vec<Position>,
  pub enemies: Vec<Enemy>,
  pub cannons: Vec<Cannon>,
}

/// Single-player arena: border ring, 250 short random line segments, then
/// enemies and cannons placed against the accumulating wall set.
pub fn generate_arena(rng: &mut impl Rng) -> ArenaLayout {
  let size = ARENA_GRID_SIZE;
  let mut walls: Vec<Position> = Vec::new();
  for i in 0..size {
    walls.push(Position::new(i, 0));
    walls.push(Position::new(i, size - 1));
    walls.push(Position::new(0, i));
    walls.push(Position::new(size - 1, i));
  }

  for _ in 0..ARENA_WALL_SEGMENTS {
    let start = Position::new(rng.gen_range(5..size - 5), rng.gen_range(5..size - 5));
    let horizontal = rng.gen_bool(0.5);
    let length = rng.gen_range(3..=7);
    for offset in 0..length {
      let cell = if horizontal {
        Position::new(start.x + offset, start.y)
      } else {
        Position::new(start.x, start.y + offset)
      };
      if cell.x < size && cell.y < size {
        walls.push(cell);
      }
    }
  }

  let mut enemies = Vec::with_capacity(ARENA_ENEMY_COUNT);
  for id in 0..ARENA_ENEMY_COUNT {
    let position = place_random(rng, size, &[], &walls);
    enemies.push(Enemy {
      id: id as u32,
      x: position.x,
      y: position.y,
    });
  }

  let mut cannons = Vec::with_capacity(ARENA_CANNON_COUNT);
  for id in 0..ARENA_CANNON_COUNT {
    let position = place_random(rng, size, &[], &walls);
    cannons.push(Cannon {
      id: id as u32,
      x: position.x,
      y: position.y,
    });
  }

  ArenaLayout {
    walls,
    enemies,
    cannons,
  }
}

/// Two-player arena: the sparser host-seeded layout on the larger grid,
/// scattered cells rather than line segments.
pub fn generate_net_arena(rng: &mut impl Rng, grid: i32) -> ArenaLayout {
  let mut walls = Vec::with_capacity(NET_ARENA_WALL_CELLS);
  for _ in 0..NET_ARENA_WALL_CELLS {
    walls.push(Position::new(rng.gen_range(0..grid), rng.gen_range(0..grid)));
  }
  let mut enemies = Vec::with_capacity(ARENA_ENEMY_COUNT);
  for id in 0..ARENA_ENEMY_COUNT {
    enemies.push(Enemy {
      id: id as u32,
      x: rng.gen_range(0..grid),
      y: rng.gen_range(0..grid),
    });
  }
  let mut cannons = Vec::with_capacity(ARENA_CANNON_COUNT);
  for id in 0..ARENA_CANNON_COUNT {
    cannons.push(Cannon {
      id: id as u32,
      x: rng.gen_range(0..grid),
      y: rng.gen_range(0..grid),
    });
  }
  ArenaLayout {
    walls,
    enemies,
    cannons,
  }
}
