pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod experience;
pub mod ghost_behavior;
pub mod ghost_life;
pub mod grid;
pub mod pacman_ai;
pub mod rng;
pub mod scheduler;
pub mod types;
pub mod upgrades;
