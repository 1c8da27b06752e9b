use super::collision::{self, DeathCause, Outcome};
use super::constants::{
  CAMERA_VIEW_SIZE, EAT_PARTICLE_COUNT, ENEMY_BOUNTY, ENEMY_KILL_PARTICLE_COUNT,
  GROWTH_EVENTS_PER_LEVEL, IMMORTAL_TICKS, LEVEL_INTERVAL_STEP_MS, MIN_INTERVAL_MS,
  PARTICLE_LIFE_DECAY, PARTICLE_SIZE_DECAY, SHAKE_DEATH, SHAKE_DECAY, SHAKE_ENEMY_KILL,
  SHAKE_FLOOR, SHAKE_IMMORTAL_PICKUP, SHAKE_NORMAL_PICKUP, SHAKE_SPEED_PICKUP,
  SPEED_BOOST_FRAMES,
};
use super::mode::ModeRules;
use super::spawner;
use super::types::{
  Direction, Food, FoodKind, Mode, Particle, Phase, Position, StatusEffects,
};
use super::world::World;
use rand::Rng;

/// Which side of a two-player match this simulation drives. Determines the
/// spawn column and initial facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSlot {
  P1,
  P2,
}

impl PlayerSlot {
  pub fn position_key(self) -> &'static str {
    match self {
      PlayerSlot::P1 => "p1",
      PlayerSlot::P2 => "p2",
    }
  }
}

/// What one movement tick did, for callers that replicate or render.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
  pub moved: bool,
  /// Index and item of the food consumed this tick.
  pub ate: Option<(usize, Food)>,
  pub died: Option<DiedEvent>,
  pub leveled: bool,
  pub enemies_destroyed: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DiedEvent {
  pub cause: DeathCause,
  /// Set when the final score beat the stored high score.
  pub new_high_score: Option<i64>,
}

/// One game instance: the snake, its world, timers and presentation state
/// (shake, particles, camera). All mutation funnels through `frame`, driven
/// by the render loop; a movement tick fires whenever the accumulated time
/// crosses the current interval.
#[derive(Debug)]
pub struct Game {
  pub phase: Phase,
  pub mode: Mode,
  pub rules: ModeRules,
  pub snake: Vec<Position>,
  direction: Direction,
  next_direction: Direction,
  pub world: World,
  pub effects: StatusEffects,
  pub score: i64,
  pub level: u32,
  pub high_score: i64,
  pub frame: u64,
  pub shake: f64,
  pub particles: Vec<Particle>,
  pub camera: Position,
  base_interval_ms: f64,
  last_move_ms: f64,
}

impl Game {
  pub fn new() -> Self {
    Self {
      phase: Phase::Menu,
      mode: Mode::Classic,
      rules: ModeRules::for_mode(Mode::Classic, false),
      snake: Vec::new(),
      direction: Direction::Right,
      next_direction: Direction::Right,
      world: World::default(),
      effects: StatusEffects::default(),
      score: 0,
      level: 1,
      high_score: 0,
      frame: 0,
      shake: 0.0,
      particles: Vec::new(),
      camera: Position::new(0, 0),
      base_interval_ms: 0.0,
      last_move_ms: 0.0,
    }
  }

  /// Starts a local single-player game: spawns the snake at the grid center
  /// and generates the mode's hazards and initial food.
  pub fn start(&mut self, mode: Mode, rng: &mut impl Rng) {
    self.reset(mode, false);
    let center = self.rules.grid / 2;
    self.snake = vec![Position::new(center, center)];

    match mode {
      Mode::Walls => {
        self.world.walls = spawner::generate_walls(rng, self.level, self.rules.grid, &self.snake);
      }
      Mode::Portal => {
        self.world.portals =
          spawner::generate_portals(rng, self.level, self.rules.grid, &self.snake, &self.world.walls);
      }
      Mode::Arena => {
        self.world.apply_arena(spawner::generate_arena(rng));
      }
      Mode::Classic | Mode::Speed => {}
    }

    spawner::fill_food(
      rng,
      &mut self.world.food,
      self.rules.food_target,
      self.rules.weights,
      self.rules.grid,
      &self.snake,
      &self.world.walls,
    );
    self.phase = Phase::Playing;
    tracing::debug!(?mode, grid = self.rules.grid, "game started");
  }

  /// Starts one side of a networked game. Food and (for arena) the hazard
  /// layout arrive through replication, so nothing is spawned locally.
  pub fn start_networked(&mut self, mode: Mode, slot: PlayerSlot) {
    self.reset(mode, true);
    let grid = self.rules.grid;
    let (x, facing) = match slot {
      PlayerSlot::P1 => (grid / 4, Direction::Right),
      PlayerSlot::P2 => (grid * 3 / 4, Direction::Left),
    };
    self.snake = vec![Position::new(x, grid / 2)];
    self.direction = facing;
    self.next_direction = facing;
    self.phase = Phase::Playing;
  }

  fn reset(&mut self, mode: Mode, netplay: bool) {
    self.mode = mode;
    self.rules = ModeRules::for_mode(mode, netplay);
    self.direction = Direction::Right;
    self.next_direction = Direction::Right;
    self.world.clear();
    self.effects = StatusEffects::default();
    self.score = 0;
    self.level = 1;
    self.frame = 0;
    self.shake = 0.0;
    self.particles.clear();
    self.camera = Position::new(0, 0);
    self.base_interval_ms = ModeRules::for_mode(mode, netplay).base_interval_ms;
    self.last_move_ms = 0.0;
  }

  pub fn pause(&mut self) {
    if self.phase == Phase::Playing {
      self.phase = Phase::Paused;
    }
  }

  pub fn resume(&mut self) {
    if self.phase == Phase::Paused {
      self.phase = Phase::Playing;
    }
  }

  /// Restarts the same mode from game over (or mid-game).
  pub fn replay(&mut self, rng: &mut impl Rng) {
    let mode = self.mode;
    let high_score = self.high_score;
    self.start(mode, rng);
    self.high_score = high_score;
  }

  pub fn to_menu(&mut self) {
    self.phase = Phase::Menu;
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  /// Buffers a direction change for the next tick. Rejected when it is the
  /// exact opposite of the currently buffered direction, which would drive
  /// the head straight into the neck.
  pub fn queue_direction(&mut self, direction: Direction) -> bool {
    if self.phase != Phase::Playing {
      return false;
    }
    if direction == self.next_direction.opposite() {
      return false;
    }
    self.next_direction = direction;
    true
  }

  /// Effective interval between movement ticks; halved while the speed-boost
  /// buff is active.
  pub fn current_interval_ms(&self) -> f64 {
    if self.effects.is_boosted() {
      self.base_interval_ms * 0.5
    } else {
      self.base_interval_ms
    }
  }

  /// Advances one rendered frame. Presentation decay and arena hazards run
  /// every frame; the snake moves only when the interval has elapsed.
  /// `opponent` is the replicated rival body in networked games.
  pub fn frame(
    &mut self,
    now_ms: f64,
    rng: &mut impl Rng,
    opponent: Option<&[Position]>,
  ) -> TickEvents {
    let mut events = TickEvents::default();
    if self.phase != Phase::Playing {
      return events;
    }

    self.frame += 1;
    self.decay_shake();
    self.advance_particles();

    if self.rules.has_arena_hazards() {
      if let Some(&head) = self.snake.first() {
        let report = self.world.step_hazards(
          rng,
          self.frame,
          head,
          self.rules.grid,
          self.rules.netplay,
          self.effects.is_immortal(),
        );
        if report.projectile_hit {
          events.died = Some(self.kill(DeathCause::Projectile));
          return events;
        }
        if !report.enemy_contacts.is_empty() {
          if self.effects.is_immortal() {
            events.enemies_destroyed += self.destroy_enemies(&report.enemy_contacts, rng);
          } else {
            events.died = Some(self.kill(DeathCause::Enemy));
            return events;
          }
        }
      }
      self.update_camera();
    }

    if now_ms - self.last_move_ms >= self.current_interval_ms() {
      self.last_move_ms = now_ms;
      self.tick(rng, opponent, &mut events);
    }

    events
  }

  /// One movement tick: commit the buffered direction, propose a head,
  /// resolve it, then mutate the body and timers.
  fn tick(&mut self, rng: &mut impl Rng, opponent: Option<&[Position]>, events: &mut TickEvents) {
    self.direction = self.next_direction;
    let (dx, dy) = self.direction.delta();
    let Some(&current_head) = self.snake.first() else {
      return;
    };
    let candidate = Position::new(current_head.x + dx, current_head.y + dy);

    let outcome = collision::resolve(
      candidate,
      &self.snake,
      &self.world,
      &self.rules,
      &self.effects,
      opponent,
    );

    match outcome {
      Outcome::Dead(cause) => {
        events.died = Some(self.kill(cause));
      }
      Outcome::Moved {
        head,
        ate,
        destroyed_enemies,
      } => {
        events.moved = true;
        if !destroyed_enemies.is_empty() {
          events.enemies_destroyed += self.destroy_enemies(&destroyed_enemies, rng);
        }

        self.snake.insert(0, head);

        if let Some(index) = ate {
          let item = self.world.food.remove(index);
          events.ate = Some((index, item));
          self.eat(head, item, rng);
          if !self.rules.netplay && self.snake.len() % GROWTH_EVENTS_PER_LEVEL == 0 {
            self.level_up(rng);
            events.leveled = true;
          }
        } else {
          self.snake.pop();
        }

        if self.rules.has_arena_hazards() {
          self.update_camera();
        }

        if self.effects.speed_boost > 0 {
          self.effects.speed_boost -= 1;
        }
        if self.effects.immortal > 0 {
          self.effects.immortal -= 1;
        }
      }
    }
  }

  fn eat(&mut self, head: Position, item: Food, rng: &mut impl Rng) {
    self.score += item.value;
    self.spawn_particles(head, EAT_PARTICLE_COUNT, rng);
    match item.kind {
      FoodKind::Speed => {
        self.effects.speed_boost = SPEED_BOOST_FRAMES;
        self.shake = SHAKE_SPEED_PICKUP;
      }
      FoodKind::Immortal => {
        self.effects.immortal = IMMORTAL_TICKS;
        self.shake = SHAKE_IMMORTAL_PICKUP;
      }
      FoodKind::Normal => {
        self.shake = SHAKE_NORMAL_PICKUP;
      }
    }

    // Networked games replace consumed food through the shared document;
    // locally the spawner tops the supply back up to the mode target.
    if !self.rules.netplay {
      spawner::fill_food(
        rng,
        &mut self.world.food,
        self.rules.food_target,
        self.rules.weights,
        self.rules.grid,
        &self.snake,
        &self.world.walls,
      );
    }
  }

  fn level_up(&mut self, rng: &mut impl Rng) {
    self.level += 1;
    if self.base_interval_ms > MIN_INTERVAL_MS {
      self.base_interval_ms -= LEVEL_INTERVAL_STEP_MS;
    }
    match self.mode {
      Mode::Walls => {
        self.world.walls = spawner::generate_walls(rng, self.level, self.rules.grid, &self.snake);
      }
      Mode::Portal => {
        self.world.portals =
          spawner::generate_portals(rng, self.level, self.rules.grid, &self.snake, &self.world.walls);
      }
      _ => {}
    }
    tracing::debug!(level = self.level, interval_ms = self.base_interval_ms, "level up");
  }

  fn kill(&mut self, cause: DeathCause) -> DiedEvent {
    self.shake = SHAKE_DEATH;
    self.phase = Phase::GameOver;
    let new_high_score = if self.score > self.high_score {
      self.high_score = self.score;
      Some(self.score)
    } else {
      None
    };
    tracing::debug!(?cause, score = self.score, "game over");
    DiedEvent {
      cause,
      new_high_score,
    }
  }

  fn destroy_enemies(&mut self, indices: &[usize], rng: &mut impl Rng) -> usize {
    let mut removed = 0;
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    for index in sorted {
      if index < self.world.enemies.len() {
        let enemy = self.world.enemies.remove(index);
        self.score += ENEMY_BOUNTY;
        self.shake = SHAKE_ENEMY_KILL;
        // Particle burst is anchored at the destroyed enemy, not the head.
        self.spawn_particles(enemy.position(), ENEMY_KILL_PARTICLE_COUNT, rng);
        removed += 1;
      }
    }
    removed
  }

  fn spawn_particles(&mut self, at: Position, count: usize, rng: &mut impl Rng) {
    for _ in 0..count {
      self.particles.push(Particle {
        x: at.x as f64 + 0.5,
        y: at.y as f64 + 0.5,
        vx: (rng.gen::<f64>() - 0.5) * 10.0,
        vy: (rng.gen::<f64>() - 0.5) * 10.0,
        life: 1.0,
        size: rng.gen::<f64>() * 5.0 + 2.0,
      });
    }
  }

  fn decay_shake(&mut self) {
    if self.shake > SHAKE_FLOOR {
      self.shake *= SHAKE_DECAY;
    } else {
      self.shake = 0.0;
    }
  }

  fn advance_particles(&mut self) {
    self.particles.retain_mut(|particle| {
      particle.x += particle.vx;
      particle.y += particle.vy;
      particle.life -= PARTICLE_LIFE_DECAY;
      particle.size *= PARTICLE_SIZE_DECAY;
      particle.life > 0.0
    });
  }

  /// Clamped top-left corner of the arena camera window following the head.
  fn update_camera(&mut self) {
    let Some(&head) = self.snake.first() else {
      return;
    };
    let half = CAMERA_VIEW_SIZE / 2;
    let max = self.rules.grid - CAMERA_VIEW_SIZE;
    self.camera = Position::new(
      (head.x - half).clamp(0, max),
      (head.y - half).clamp(0, max),
    );
  }
}

impl Default for Game {
  fn default() -> Self {
    Self::new()
  }
}
