use super::*;
use crate::constants::MAX_CELLS_PER_TICK;
use crate::types::Point;

use super::utils::crossed;

impl Match {
    pub(super) fn update_ghosts(&mut self, dt_ms: u64) {
        let pacman = Point::from(self.pacman.cell);
        for idx in 0..self.ghosts.len() {
            let ghost = &mut self.ghosts[idx];
            if !ghost.active {
                continue;
            }
            match ghost.behavior.active_mode() {
                None | Some(GhostMode::Home) => continue,
                Some(_) => {}
            }

            let speed = ghost.stats.speed(ghost.behavior.speed_multiplier());
            ghost.move_buffer =
                (ghost.move_buffer + speed * dt_seconds(dt_ms)).min(MAX_CELLS_PER_TICK);
            if ghost.move_buffer < 1.0 {
                continue;
            }
            let node = self.maze.node(ghost.cell);
            let dir = ghost
                .behavior
                .choose_direction(&node, ghost.cell, ghost.dir, pacman, &mut self.rng);
            let next = ghost.cell.step(dir);
            if dir.is_none() || !self.maze.is_walkable(next) {
                ghost.move_buffer = 0.0;
                continue;
            }
            ghost.move_buffer -= 1.0;
            ghost.cell = next;
            ghost.dir = dir;
            self.collect_pellet(next, Collector::Ghost { ghost_id: idx });
        }
    }

    /// Pacman against every active ghost outside Home: same cell or swapped cells.
    pub(super) fn resolve_collisions(&mut self, now_ms: u64, pacman_before: Cell, ghosts_before: &[Cell]) {
        for idx in 0..self.ghosts.len() {
            if self.ended || !self.pacman.alive {
                return;
            }
            let ghost = &self.ghosts[idx];
            if !ghost.active {
                continue;
            }
            let mode = match ghost.behavior.active_mode() {
                None | Some(GhostMode::Home) => continue,
                Some(mode) => mode,
            };
            let ghost_before = ghosts_before.get(idx).copied().unwrap_or(ghost.cell);
            if !crossed(pacman_before, self.pacman.cell, ghost_before, ghost.cell) {
                continue;
            }

            if mode == GhostMode::Frightened {
                self.ghost_eaten(idx, now_ms);
            } else {
                self.pacman_died(now_ms);
            }
        }
    }

    fn ghost_eaten(&mut self, idx: usize, now_ms: u64) {
        let multiplier = self.ghost_multiplier;
        let points = self.ghosts[idx].stats.points * multiplier;
        self.score_pacman += points;
        self.ghost_multiplier += 1;
        self.stats.ghosts_eaten += 1;
        self.events.push(MatchEvent::GhostEaten {
            ghost_id: idx,
            points,
            multiplier,
        });
        info!(ghost_id = idx, points, multiplier, "ghost eaten");

        let ghost = &mut self.ghosts[idx];
        ghost.dir = Direction::None;
        ghost.move_buffer = 0.0;
        if !ghost.lives.on_eaten(&mut self.events) {
            ghost.active = false;
            ghost.behavior.deactivate(&mut self.timers);
            if self.ghosts.iter().all(|ghost| !ghost.lives.is_alive()) {
                self.end_match(MatchOutcome::PacmanVictory);
            }
            return;
        }

        ghost.cell = self.maze.ghost_home;
        if ghost.lives.trigger_respawn(&mut self.events) {
            let duration_ms = ghost.stats.respawn_duration_ms;
            let mut ctx = BehaviorContext {
                timers: &mut self.timers,
                events: &mut self.events,
                now_ms,
            };
            ghost.behavior.enable(GhostMode::Home, duration_ms, &mut ctx);
        }
    }

    /// Mode timer expiry; leaving Home puts the ghost back on the field at the door.
    pub(super) fn expire_ghost_mode(&mut self, ghost_id: usize, mode: GhostMode, now_ms: u64) {
        let Some(ghost) = self.ghosts.get_mut(ghost_id) else {
            return;
        };
        if !ghost.active {
            return;
        }
        let mut ctx = BehaviorContext {
            timers: &mut self.timers,
            events: &mut self.events,
            now_ms,
        };
        let Some(transition) = ghost.behavior.expire(mode, &mut ctx) else {
            return;
        };
        if transition.from == Some(GhostMode::Home) {
            ghost.cell = self.maze.ghost_exit;
            ghost.dir = Direction::None;
            ghost.move_buffer = 0.0;
            debug!(ghost_id, "ghost left home");
        }
    }
}
