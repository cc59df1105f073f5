pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const PACMAN_START_LIVES: u32 = 3;
pub const PACMAN_BASE_SPEED: f32 = 8.0;
pub const PACMAN_RESET_DELAY_MS: u64 = 3_000;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;

pub const FLEE_TRIGGER_DISTANCE: f32 = 4.0;
pub const CHASE_TRIGGER_DISTANCE: f32 = 7.0;
pub const SAFE_PELLET_DISTANCE: f32 = 3.0;
pub const HIGH_DANGER_DISTANCE: f32 = 5.0;
pub const MEDIUM_DANGER_DISTANCE: f32 = 7.0;
pub const DANGER_WEIGHT: f32 = 10.0;

pub const FLEE_HYSTERESIS_BONUS: f32 = 0.5;
pub const CHASE_HYSTERESIS_BONUS: f32 = 3.0;
pub const COLLECT_HYSTERESIS_BONUS: f32 = 1.0;

pub const GHOST_AHEAD_ALIGNMENT: f32 = 0.7;
pub const CORRIDOR_MAX_OPEN_DIRECTIONS: usize = 2;

/// Movers advance at most one cell per tick so every crossing is seen by the collision sweep.
pub const MAX_CELLS_PER_TICK: f32 = 1.0;

pub fn danger_factor(nearest_dangerous_ghost: f32) -> f32 {
    if nearest_dangerous_ghost < HIGH_DANGER_DISTANCE {
        return 1.0;
    }
    if nearest_dangerous_ghost < MEDIUM_DANGER_DISTANCE {
        return 0.5;
    }
    0.0
}

pub fn seconds_to_ms(seconds: i32) -> u64 {
    seconds.max(0) as u64 * 1_000
}
