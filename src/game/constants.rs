pub const GRID_SIZE: i32 = 20;
pub const ARENA_GRID_SIZE: i32 = 150;
pub const NET_ARENA_GRID_SIZE: i32 = 200;
pub const CAMERA_VIEW_SIZE: i32 = 21;

pub const BASE_INTERVAL_MS: f64 = 150.0;
pub const SPEED_MODE_INTERVAL_MS: f64 = 100.0;
pub const MIN_INTERVAL_MS: f64 = 50.0;
pub const LEVEL_INTERVAL_STEP_MS: f64 = 10.0;
pub const GROWTH_EVENTS_PER_LEVEL: usize = 5;

pub const SPEED_BOOST_FRAMES: u32 = 420;
pub const IMMORTAL_TICKS: u32 = 600;

pub const MAX_PLACE_ATTEMPTS: usize = 100;
pub const FOOD_TARGET: usize = 2;
pub const ARENA_FOOD_TARGET: usize = 20;

pub const NORMAL_FOOD_VALUE: i64 = 10;
pub const SPEED_FOOD_VALUE: i64 = 15;
pub const IMMORTAL_FOOD_VALUE: i64 = 50;

pub const ARENA_WALL_SEGMENTS: usize = 250;
pub const ARENA_ENEMY_COUNT: usize = 20;
pub const ARENA_CANNON_COUNT: usize = 7;
pub const NET_ARENA_WALL_CELLS: usize = 300;

pub const PROJECTILE_SPEED: f64 = 0.5;
pub const CANNON_CADENCE: u64 = 10;
pub const NET_CANNON_CADENCE: u64 = 9;
pub const CANNON_FIRE_CHANCE: f64 = 0.02;
pub const ENEMY_CADENCE: u64 = 15;
pub const NET_ENEMY_CADENCE: u64 = 20;
pub const ENEMY_CHASE_RADIUS: f64 = 10.0;
pub const NET_ENEMY_CHASE_DISTANCE: i32 = 30;
pub const ENEMY_WANDER_CHANCE: f64 = 0.3;
pub const ENEMY_BOUNTY: i64 = 100;

pub const SHAKE_DECAY: f64 = 0.9;
pub const SHAKE_FLOOR: f64 = 0.5;
pub const SHAKE_DEATH: f64 = 20.0;
pub const SHAKE_IMMORTAL_PICKUP: f64 = 10.0;
pub const SHAKE_SPEED_PICKUP: f64 = 5.0;
pub const SHAKE_NORMAL_PICKUP: f64 = 2.0;
pub const SHAKE_ENEMY_KILL: f64 = 10.0;

pub const PARTICLE_LIFE_DECAY: f64 = 0.05;
pub const PARTICLE_SIZE_DECAY: f64 = 0.95;
pub const EAT_PARTICLE_COUNT: usize = 15;
pub const ENEMY_KILL_PARTICLE_COUNT: usize = 20;

pub const MATCH_DURATION_MS: f64 = 120_000.0;

pub const ROOM_CODE_LENGTH: usize = 6;
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const MAX_ROOM_PLAYERS: usize = 2;
