use crate::grid::Maze;
use crate::types::{Cell, GhostMode};

pub(super) fn dt_seconds(dt_ms: u64) -> f32 {
    dt_ms as f32 / 1_000.0
}

/// Ghosts that start in Home wait inside the house; everyone else starts at the door.
pub(super) fn spawn_cell(maze: &Maze, initial: GhostMode) -> Cell {
    if initial == GhostMode::Home {
        maze.ghost_home
    } else {
        maze.ghost_exit
    }
}

/// Same cell after the move, or the two passed through each other.
pub(super) fn crossed(pacman_before: Cell, pacman_now: Cell, ghost_before: Cell, ghost_now: Cell) -> bool {
    if pacman_now == ghost_now {
        return true;
    }
    pacman_now == ghost_before && ghost_now == pacman_before
}
