use super::constants::{
  CANNON_CADENCE, CANNON_FIRE_CHANCE, ENEMY_CADENCE, ENEMY_CHASE_RADIUS,
  ENEMY_WANDER_CHANCE, NET_CANNON_CADENCE, NET_ENEMY_CADENCE, NET_ENEMY_CHASE_DISTANCE,
  PROJECTILE_SPEED,
};
use super::spawner::ArenaLayout;
use super::types::{Cannon, Enemy, Food, Portal, Position, Projectile};
use rand::Rng;

const CARDINALS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Everything on the grid that is not the snake itself.
#[derive(Debug, Clone, Default)]
pub struct World {
  pub walls: Vec<Position>,
  pub portals: Vec<Portal>,
  pub food: Vec<Food>,
  pub enemies: Vec<Enemy>,
  pub cannons: Vec<Cannon>,
  pub projectiles: Vec<Projectile>,
}

/// Hazard activity observed during one rendered frame, independent of the
/// movement cadence.
#[derive(Debug, Clone, Default)]
pub struct HazardReport {
  /// A projectile passed within one cell of the head.
  pub projectile_hit: bool,
  /// Enemies that stepped onto the head this frame (indices into `enemies`).
  pub enemy_contacts: Vec<usize>,
}

impl World {
  pub fn clear(&mut self) {
    self.walls.clear();
    self.portals.clear();
    self.food.clear();
    self.enemies.clear();
    self.cannons.clear();
    self.projectiles.clear();
  }

  pub fn apply_arena(&mut self, layout: ArenaLayout) {
    self.walls = layout.walls;
    self.enemies = layout.enemies;
    self.cannons = layout.cannons;
    self.projectiles.clear();
  }

  pub fn wall_at(&self, position: Position) -> bool {
    self.walls.contains(&position)
  }

  pub fn portal_exit(&self, position: Position) -> Option<Position> {
    self
      .portals
      .iter()
      .find(|portal| portal.entrance == position)
      .map(|portal| portal.exit)
  }

  pub fn food_at(&self, position: Position) -> Option<usize> {
    self.food.iter().position(|item| item.position() == position)
  }

  /// Advances projectiles, cannon fire and enemy movement for one frame.
  /// Each entity type runs on its own sub-cadence keyed off the frame
  /// counter; the local and networked arena variants use different cadences
  /// and chase rules, preserved as observed tunings.
  pub fn step_hazards(
    &mut self,
    rng: &mut impl Rng,
    frame: u64,
    head: Position,
    grid: i32,
    netplay: bool,
    immortal: bool,
  ) -> HazardReport {
    let mut report = HazardReport::default();

    self.advance_projectiles(grid);
    if !immortal {
      report.projectile_hit = self.projectiles.iter().any(|projectile| {
        let dx = projectile.x - head.x as f64;
        let dy = projectile.y - head.y as f64;
        dx.hypot(dy) < 1.0
      });
    }

    let cannon_cadence = if netplay { NET_CANNON_CADENCE } else { CANNON_CADENCE };
    if frame % cannon_cadence == 0 {
      self.fire_cannons(rng, netplay);
    }

    let enemy_cadence = if netplay { NET_ENEMY_CADENCE } else { ENEMY_CADENCE };
    if frame % enemy_cadence == 0 {
      report.enemy_contacts = self.step_enemies(rng, head, grid, netplay);
    }

    report
  }

  fn advance_projectiles(&mut self, grid: i32) {
    let walls = &self.walls;
    self.projectiles.retain_mut(|projectile| {
      projectile.x += projectile.dx;
      projectile.y += projectile.dy;
      if projectile.x < 0.0
        || projectile.x >= grid as f64
        || projectile.y < 0.0
        || projectile.y >= grid as f64
      {
        return false;
      }
      let cell = Position::new(
        projectile.x.round() as i32,
        projectile.y.round() as i32,
      );
      !walls.contains(&cell)
    });
  }

  fn fire_cannons(&mut self, rng: &mut impl Rng, netplay: bool) {
    if netplay {
      // Networked cannons volley all four directions on every cadence hit.
      for cannon in &self.cannons {
        for (dx, dy) in CARDINALS {
          self.projectiles.push(Projectile {
            x: cannon.x as f64,
            y: cannon.y as f64,
            dx: dx as f64 * PROJECTILE_SPEED,
            dy: dy as f64 * PROJECTILE_SPEED,
          });
        }
      }
      return;
    }

    for cannon in &self.cannons {
      if rng.gen::<f64>() < CANNON_FIRE_CHANCE {
        let (dx, dy) = CARDINALS[rng.gen_range(0..CARDINALS.len())];
        self.projectiles.push(Projectile {
          x: cannon.x as f64,
          y: cannon.y as f64,
          dx: dx as f64 * PROJECTILE_SPEED,
          dy: dy as f64 * PROJECTILE_SPEED,
        });
      }
    }
  }

  fn step_enemies(&mut self, rng: &mut impl Rng, head: Position, grid: i32, netplay: bool) -> Vec<usize> {
    let mut contacts = Vec::new();
    for (index, enemy) in self.enemies.iter_mut().enumerate() {
      let dx = head.x - enemy.x;
      let dy = head.y - enemy.y;

      if netplay {
        if dx.abs() + dy.abs() < NET_ENEMY_CHASE_DISTANCE {
          enemy.x += dx.signum();
          enemy.y += dy.signum();
        } else {
          let (mx, my) = CARDINALS[rng.gen_range(0..CARDINALS.len())];
          enemy.x += mx;
          enemy.y += my;
        }
        enemy.x = enemy.x.clamp(0, grid - 1);
        enemy.y = enemy.y.clamp(0, grid - 1);
      } else if ((dx * dx + dy * dy) as f64).sqrt() < ENEMY_CHASE_RADIUS {
        // Chase along the dominant axis only.
        if dx.abs() > dy.abs() {
          enemy.x += dx.signum();
        } else {
          enemy.y += dy.signum();
        }
      } else if rng.gen::<f64>() < ENEMY_WANDER_CHANCE {
        let (mx, my) = CARDINALS[rng.gen_range(0..CARDINALS.len())];
        enemy.x += mx;
        enemy.y += my;
      }

      if enemy.x == head.x && enemy.y == head.y {
        contacts.push(index);
      }
    }
    contacts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn projectiles_expire_at_bounds_and_walls() {
    let mut world = World::default();
    world.projectiles.push(Projectile {
      x: 19.8,
      y: 5.0,
      dx: 0.5,
      dy: 0.0,
    });
    world.projectiles.push(Projectile {
      x: 5.0,
      y: 5.0,
      dx: 0.5,
      dy: 0.0,
    });
    world.walls.push(Position::new(6, 5));
    world.advance_projectiles(20);
    // First left the grid; second rounded onto the wall at (6, 5) after
    // moving to x = 5.5.
    assert_eq!(world.projectiles.len(), 0);
  }

  #[test]
  fn projectiles_keep_flying_in_open_space() {
    let mut world = World::default();
    world.projectiles.push(Projectile {
      x: 5.0,
      y: 5.0,
      dx: 0.0,
      dy: 0.5,
    });
    world.advance_projectiles(20);
    assert_eq!(world.projectiles.len(), 1);
    assert!((world.projectiles[0].y - 5.5).abs() < 1e-9);
  }

  #[test]
  fn networked_cannons_volley_all_directions() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut world = World::default();
    world.cannons.push(Cannon { id: 0, x: 10, y: 10 });
    world.fire_cannons(&mut rng, true);
    assert_eq!(world.projectiles.len(), 4);
  }

  #[test]
  fn nearby_enemy_chases_head() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut world = World::default();
    world.enemies.push(Enemy { id: 0, x: 5, y: 5 });
    let contacts = world.step_enemies(&mut rng, Position::new(9, 5), 150, false);
    assert!(contacts.is_empty());
    // Dominant axis is x; one step toward the head.
    assert_eq!(world.enemies[0].x, 6);
    assert_eq!(world.enemies[0].y, 5);
  }

  #[test]
  fn enemy_stepping_onto_head_is_reported() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut world = World::default();
    world.enemies.push(Enemy { id: 0, x: 8, y: 5 });
    let contacts = world.step_enemies(&mut rng, Position::new(9, 5), 150, false);
    assert_eq!(contacts, vec![0]);
  }

  #[test]
  fn networked_enemies_stay_in_bounds() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut world = World::default();
    world.enemies.push(Enemy { id: 0, x: 0, y: 0 });
    for _ in 0..50 {
      world.step_enemies(&mut rng, Position::new(199, 199), 200, true);
    }
    let enemy = world.enemies[0];
    assert!(enemy.x >= 0 && enemy.x < 200);
    assert!(enemy.y >= 0 && enemy.y < 200);
  }
}
