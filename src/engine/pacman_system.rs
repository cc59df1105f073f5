use super::*;
use crate::constants::MAX_CELLS_PER_TICK;
use crate::pacman_ai::{decide, Decision, DecisionInput, GhostSighting};
use crate::types::Point;

impl Match {
    pub(super) fn update_pacman(&mut self, dt_ms: u64) {
        if !self.pacman.alive {
            return;
        }

        let decision = self.decide_pacman();
        self.pacman.tier = Some(decision.tier);
        self.pacman.dir = decision.direction;

        let gain = self.pacman_speed * dt_seconds(dt_ms);
        self.pacman.move_buffer = (self.pacman.move_buffer + gain).min(MAX_CELLS_PER_TICK);
        if self.pacman.move_buffer < 1.0 {
            return;
        }
        let next = self.pacman.cell.step(self.pacman.dir);
        if self.pacman.dir.is_none() || !self.maze.is_walkable(next) {
            self.pacman.move_buffer = 0.0;
            return;
        }
        self.pacman.move_buffer -= 1.0;
        self.pacman.cell = next;
        self.collect_pellet(next, Collector::Pacman);
    }

    fn decide_pacman(&self) -> Decision {
        let sightings: Vec<GhostSighting> = self
            .ghosts
            .iter()
            .map(|ghost| GhostSighting {
                position: Point::from(ghost.cell),
                mode: if ghost.active {
                    ghost.behavior.active_mode()
                } else {
                    None
                },
            })
            .collect();
        let pellets: Vec<Point> = self
            .pellets
            .iter()
            .filter(|pellet| pellet.active)
            .map(|pellet| Point::from(pellet.cell))
            .collect();

        let input = DecisionInput {
            position: Point::from(self.pacman.cell),
            heading: self.pacman.dir,
            ghosts: &sightings,
            pellets: &pellets,
        };
        decide(&self.maze.node(self.pacman.cell), &input)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MatchConfig;
    use crate::constants::TICK_MS;
    use crate::engine::{Match, MatchOptions};
    use crate::types::{DecisionTier, Direction};

    fn corridor_match() -> Match {
        let config = MatchConfig {
            maze: vec![
                "#########".to_string(),
                "#P.....o#".to_string(),
                "###=#####".to_string(),
                "##DG#####".to_string(),
                "#########".to_string(),
            ],
            ..MatchConfig::default()
        };
        Match::from_config(&config, MatchOptions::default()).expect("corridor match builds")
    }

    #[test]
    fn pacman_walks_the_corridor_collecting_pellets() {
        let mut game = corridor_match();
        for ghost in &mut game.ghosts {
            ghost.active = false;
            ghost.behavior.deactivate(&mut game.timers);
        }

        let start = game.pacman.cell;
        for _ in 0..3 {
            game.step(TICK_MS);
        }

        assert_eq!(game.pacman.dir, Direction::Right);
        assert_eq!(game.pacman.tier, Some(DecisionTier::Collect));
        assert!(game.pacman.cell.x > start.x);
        assert_eq!(game.score_pacman, game.pellet_points);
        assert_eq!(game.stats.pellets_by_pacman, 1);
    }

    #[test]
    fn fast_pacman_steps_one_cell_per_tick() {
        let mut game = corridor_match();
        game.pacman_speed = 100.0;
        for ghost in &mut game.ghosts {
            ghost.active = false;
            ghost.behavior.deactivate(&mut game.timers);
        }

        let start = game.pacman.cell;
        for tick in 1..=3 {
            game.step(TICK_MS);
            assert_eq!(game.pacman.cell.x, start.x + tick);
            assert_eq!(game.pacman.cell.y, start.y);
        }
        assert_eq!(game.stats.pellets_by_pacman, 3);
    }

    #[test]
    fn fast_pacman_meets_a_ghost_instead_of_passing_it() {
        let mut game = corridor_match();
        game.pacman_speed = 100.0;
        for ghost in game.ghosts.iter_mut().skip(1) {
            ghost.active = false;
            ghost.behavior.deactivate(&mut game.timers);
        }
        let ghost_cell = game.pacman.cell.step(Direction::Right).step(Direction::Right);
        game.ghosts[0].cell = ghost_cell;
        game.ghosts[0].stats.base_speed = 0.0;

        for _ in 0..3 {
            game.step(TICK_MS);
        }
        assert!(game.pacman.cell.x <= ghost_cell.x);
        assert!(!game.pacman.alive || game.pacman.cell.x < ghost_cell.x);
    }

    #[test]
    fn dead_pacman_stays_put() {
        let mut game = corridor_match();
        game.pacman_died(0);
        let cell = game.pacman.cell;
        game.update_pacman(TICK_MS * 10);
        assert_eq!(game.pacman.cell, cell);
        assert_eq!(game.pacman.dir, Direction::None);
    }
}
