use super::constants::{
  ARENA_FOOD_TARGET, ARENA_GRID_SIZE, BASE_INTERVAL_MS, FOOD_TARGET, GRID_SIZE,
  NET_ARENA_GRID_SIZE, SPEED_MODE_INTERVAL_MS,
};
use super::types::{FoodKind, Mode};
use rand::Rng;

/// Weighted food-kind table. `normal` takes whatever probability mass the two
/// special kinds leave over. The splits differ between the single-player
/// modes and multiplayer and are preserved as separate tunings.
#[derive(Debug, Clone, Copy)]
pub struct SpawnWeights {
  pub immortal: f64,
  pub speed: f64,
}

impl SpawnWeights {
  pub fn pick(&self, rng: &mut impl Rng) -> FoodKind {
    let roll: f64 = rng.gen();
    if roll < self.immortal {
      FoodKind::Immortal
    } else if roll < self.immortal + self.speed {
      FoodKind::Speed
    } else {
      FoodKind::Normal
    }
  }
}

const LOCAL_WEIGHTS: SpawnWeights = SpawnWeights {
  immortal: 0.05,
  speed: 0.10,
};

const DENSE_WEIGHTS: SpawnWeights = SpawnWeights {
  immortal: 0.15,
  speed: 0.15,
};

/// Per-mode ruleset: boundary behavior, hazard presence, spawn density and
/// speed. `netplay` selects the two-player variant of a mode where it is
/// tuned differently (arena grid size and boundary).
#[derive(Debug, Clone, Copy)]
pub struct ModeRules {
  pub mode: Mode,
  pub netplay: bool,
  pub grid: i32,
  pub base_interval_ms: f64,
  pub food_target: usize,
  pub weights: SpawnWeights,
}

impl ModeRules {
  pub fn for_mode(mode: Mode, netplay: bool) -> Self {
    let grid = match mode {
      Mode::Arena if netplay => NET_ARENA_GRID_SIZE,
      Mode::Arena => ARENA_GRID_SIZE,
      _ => GRID_SIZE,
    };
    let base_interval_ms = match mode {
      Mode::Speed => SPEED_MODE_INTERVAL_MS,
      _ => BASE_INTERVAL_MS,
    };
    let food_target = match mode {
      Mode::Arena => ARENA_FOOD_TARGET,
      _ => FOOD_TARGET,
    };
    let weights = match mode {
      Mode::Arena => DENSE_WEIGHTS,
      _ if netplay => DENSE_WEIGHTS,
      _ => LOCAL_WEIGHTS,
    };
    Self {
      mode,
      netplay,
      grid,
      base_interval_ms,
      food_target,
      weights,
    }
  }

  /// Whether a head beyond the boundary wraps instead of dying. The immortal
  /// buff grants wrap everywhere; networked arena always wraps, local arena
  /// only while immortal.
  pub fn wraps(&self, immortal: bool) -> bool {
    if immortal {
      return true;
    }
    match self.mode {
      Mode::Speed | Mode::Portal => true,
      Mode::Arena => self.netplay,
      Mode::Classic | Mode::Walls => false,
    }
  }

  pub fn has_static_walls(&self) -> bool {
    matches!(self.mode, Mode::Walls | Mode::Arena)
  }

  pub fn has_portals(&self) -> bool {
    matches!(self.mode, Mode::Portal)
  }

  pub fn has_arena_hazards(&self) -> bool {
    matches!(self.mode, Mode::Arena)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn policy_table_matches_reference_tuning() {
    let classic = ModeRules::for_mode(Mode::Classic, false);
    assert_eq!(classic.grid, 20);
    assert_eq!(classic.base_interval_ms, 150.0);
    assert_eq!(classic.food_target, 2);
    assert!(!classic.wraps(false));
    assert!(classic.wraps(true));

    let speed = ModeRules::for_mode(Mode::Speed, false);
    assert_eq!(speed.base_interval_ms, 100.0);
    assert!(speed.wraps(false));

    let arena = ModeRules::for_mode(Mode::Arena, false);
    assert_eq!(arena.grid, 150);
    assert_eq!(arena.food_target, 20);
    assert!(!arena.wraps(false));

    let net_arena = ModeRules::for_mode(Mode::Arena, true);
    assert_eq!(net_arena.grid, 200);
    assert!(net_arena.wraps(false));
  }

  #[test]
  fn spawn_weights_cover_all_kinds() {
    let mut rng = StdRng::seed_from_u64(7);
    let weights = ModeRules::for_mode(Mode::Arena, false).weights;
    let mut seen = [0usize; 3];
    for _ in 0..2000 {
      match weights.pick(&mut rng) {
        FoodKind::Normal => seen[0] += 1,
        FoodKind::Speed => seen[1] += 1,
        FoodKind::Immortal => seen[2] += 1,
      }
    }
    assert!(seen.iter().all(|&count| count > 0));
    // Normal carries the bulk of the mass in every table.
    assert!(seen[0] > seen[1] && seen[0] > seen[2]);
  }
}
