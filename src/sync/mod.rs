pub mod replication;
pub mod rooms;
pub mod store;
