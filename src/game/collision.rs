use super::mode::ModeRules;
use super::types::{Position, StatusEffects};
use super::world::World;

/// Why a tick killed the snake. Carried through to the caller so networked
/// games can report the right winner and local games can shake the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
  OutOfBounds,
  SelfBite,
  Wall,
  Enemy,
  Projectile,
  Opponent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Dead(DeathCause),
  Moved {
    head: Position,
    ate: Option<usize>,
    /// Indices of enemies destroyed by an immortal head this tick.
    destroyed_enemies: Vec<usize>,
  },
}

fn wrap_axis(value: i32, grid: i32) -> i32 {
  value.rem_euclid(grid)
}

fn in_bounds(position: Position, grid: i32) -> bool {
  position.x >= 0 && position.x < grid && position.y >= 0 && position.y < grid
}

/// Resolves a proposed head position against the world in a fixed order:
/// bounds/wrap, portal transit, self, static walls, enemies, projectiles,
/// opponent, food. The first fatal condition wins; the food check only runs
/// once survival is confirmed.
pub fn resolve(
  head: Position,
  snake: &[Position],
  world: &World,
  rules: &ModeRules,
  effects: &StatusEffects,
  opponent: Option<&[Position]>,
) -> Outcome {
  let immortal = effects.is_immortal();
  let mut head = head;

  if !in_bounds(head, rules.grid) {
    if rules.wraps(immortal) {
      head = Position::new(wrap_axis(head.x, rules.grid), wrap_axis(head.y, rules.grid));
    } else {
      return Outcome::Dead(DeathCause::OutOfBounds);
    }
  }

  // Portal transit is immediate and unconditional; the exit cell is not
  // re-checked this tick, even if it overlaps a wall.
  if rules.has_portals() {
    if let Some(exit) = world.portal_exit(head) {
      head = exit;
    }
  }

  if !immortal && snake.contains(&head) {
    return Outcome::Dead(DeathCause::SelfBite);
  }

  if rules.has_static_walls() && !immortal && world.wall_at(head) {
    return Outcome::Dead(DeathCause::Wall);
  }

  let mut destroyed_enemies = Vec::new();
  if rules.has_arena_hazards() {
    for (index, enemy) in world.enemies.iter().enumerate() {
      let contact = (enemy.x - head.x).abs() < 1 && (enemy.y - head.y).abs() < 1;
      if !contact {
        continue;
      }
      if immortal {
        destroyed_enemies.push(index);
      } else {
        return Outcome::Dead(DeathCause::Enemy);
      }
    }

    if !immortal {
      for projectile in &world.projectiles {
        let dx = projectile.x - head.x as f64;
        let dy = projectile.y - head.y as f64;
        if dx.hypot(dy) < 1.0 {
          return Outcome::Dead(DeathCause::Projectile);
        }
      }
    }
  }

  // The rival snake is not an environmental hazard; immortality does not
  // protect against it.
  if let Some(opponent) = opponent {
    if opponent.contains(&head) {
      return Outcome::Dead(DeathCause::Opponent);
    }
  }

  let ate = world.food_at(head);

  Outcome::Moved {
    head,
    ate,
    destroyed_enemies,
  }
}
