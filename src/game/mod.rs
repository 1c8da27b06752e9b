pub mod collision;
pub mod constants;
pub mod mode;
pub mod spawner;
pub mod step;
pub mod types;
pub mod world;
