use tracing::{debug, info};

use crate::config::MatchConfig;
use crate::constants::{PACMAN_RESET_DELAY_MS, TICK_RATE};
use crate::error::ConfigError;
use crate::experience::ExperienceTracker;
use crate::ghost_behavior::{BehaviorContext, GhostBehavior};
use crate::ghost_life::GhostLives;
use crate::grid::Maze;
use crate::rng::SimRng;
use crate::scheduler::{MatchTimers, TimerAction, TimerKey};
use crate::types::{
    Cell, Collector, DecisionTier, Direction, GhostMode, GhostView, MatchEvent, MatchOutcome,
    MatchSnapshot, MatchSummary, PacmanView, PelletKind,
};
use crate::upgrades::GhostStats;

mod ghost_system;
mod pacman_system;
mod utils;

use self::utils::{dt_seconds, spawn_cell};

#[derive(Clone, Debug, Default)]
struct MatchStats {
    pellets_by_pacman: u32,
    pellets_by_ghosts: u32,
    ghosts_eaten: u32,
    pacman_deaths: u32,
}

#[derive(Clone, Debug)]
struct Pellet {
    cell: Cell,
    kind: PelletKind,
    active: bool,
}

#[derive(Clone, Debug)]
struct PacmanInternal {
    cell: Cell,
    dir: Direction,
    spawn: Cell,
    alive: bool,
    move_buffer: f32,
    tier: Option<DecisionTier>,
}

#[derive(Clone, Debug)]
struct GhostInternal {
    stats: GhostStats,
    behavior: GhostBehavior,
    lives: GhostLives,
    cell: Cell,
    dir: Direction,
    move_buffer: f32,
    active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MatchOptions {
    pub seed: u64,
    pub time_limit_ms: Option<u64>,
}

/// Owns every entity of one match and drives it one tick at a time.
#[derive(Clone, Debug)]
pub struct Match {
    maze: Maze,
    pellets: Vec<Pellet>,
    pacman: PacmanInternal,
    ghosts: Vec<GhostInternal>,
    timers: MatchTimers,
    rng: SimRng,
    events: Vec<MatchEvent>,
    experience: ExperienceTracker,

    pacman_speed: f32,
    pacman_start_lives: u32,
    pellet_points: u32,
    power_pellet_points: u32,

    score_pacman: u32,
    score_ghost: u32,
    pacman_lives: u32,
    ghost_multiplier: u32,
    round: u32,

    elapsed_ms: u64,
    tick_counter: u64,
    time_limit_ms: Option<u64>,
    ended: bool,
    outcome: Option<MatchOutcome>,
    stats: MatchStats,
}

impl Match {
    /// Builds a match whose ghosts use the upgrade-adjusted stats of the config's shop.
    pub fn from_config(config: &MatchConfig, options: MatchOptions) -> Result<Self, ConfigError> {
        let stats = config.build_shop().upgraded_stats(&config.ghosts);
        Self::new(config, stats, options)
    }

    pub fn new(
        config: &MatchConfig,
        ghost_stats: Vec<GhostStats>,
        options: MatchOptions,
    ) -> Result<Self, ConfigError> {
        if ghost_stats.is_empty() {
            return Err(ConfigError::NoGhosts);
        }
        let maze = config.build_maze()?;

        let pellets = maze
            .pellets
            .iter()
            .map(|spawn| Pellet {
                cell: spawn.cell,
                kind: spawn.kind,
                active: true,
            })
            .collect();
        let pacman = PacmanInternal {
            cell: maze.pacman_spawn,
            dir: Direction::None,
            spawn: maze.pacman_spawn,
            alive: true,
            move_buffer: 0.0,
            tier: None,
        };
        let ghosts = ghost_stats
            .into_iter()
            .enumerate()
            .map(|(id, stats)| GhostInternal {
                behavior: GhostBehavior::new(id, stats.mode_table(), stats.initial_behavior),
                lives: GhostLives::new(id, stats.lives),
                cell: spawn_cell(&maze, stats.initial_behavior),
                dir: Direction::None,
                move_buffer: 0.0,
                active: true,
                stats,
            })
            .collect();

        let mut game = Self {
            maze,
            pellets,
            pacman,
            ghosts,
            timers: MatchTimers::new(),
            rng: SimRng::new(options.seed),
            events: Vec::new(),
            experience: ExperienceTracker::new(config.experience_curve.clone()),
            pacman_speed: config.pacman_speed,
            pacman_start_lives: config.pacman_lives.max(1),
            pellet_points: config.pellet_points,
            power_pellet_points: config.power_pellet_points,
            score_pacman: 0,
            score_ghost: 0,
            pacman_lives: 0,
            ghost_multiplier: 1,
            round: 0,
            elapsed_ms: 0,
            tick_counter: 0,
            time_limit_ms: options.time_limit_ms,
            ended: false,
            outcome: None,
            stats: MatchStats::default(),
        };
        game.new_game();
        Ok(game)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// Resets scores, lives, experience and ghost lives, then starts a round.
    pub fn new_game(&mut self) {
        self.timers.clear();
        self.score_pacman = 0;
        self.score_ghost = 0;
        self.pacman_lives = self.pacman_start_lives;
        self.ghost_multiplier = 1;
        self.round = 0;
        self.ended = false;
        self.outcome = None;
        self.stats = MatchStats::default();
        self.experience.reset();
        for ghost in &mut self.ghosts {
            ghost.active = true;
            ghost.lives.initialize(ghost.stats.lives, &mut self.events);
        }
        info!(
            ghosts = self.ghosts.len(),
            lives = self.pacman_lives,
            "new game"
        );
        self.new_round();
    }

    /// Reactivates every pellet, then resets the living entities.
    pub fn new_round(&mut self) {
        self.round += 1;
        for pellet in &mut self.pellets {
            pellet.active = true;
        }
        self.events.push(MatchEvent::RoundStarted { round: self.round });
        info!(round = self.round, "round started");
        self.reset_state();
    }

    /// Puts Pacman and every ghost with lives left back at their spawns in their initial behavior.
    pub fn reset_state(&mut self) {
        let now_ms = self.elapsed_ms;
        for ghost in &mut self.ghosts {
            if !ghost.active || !ghost.lives.is_alive() {
                continue;
            }
            ghost.cell = spawn_cell(&self.maze, ghost.behavior.initial_mode());
            ghost.dir = Direction::None;
            ghost.move_buffer = 0.0;
            let mut ctx = BehaviorContext {
                timers: &mut self.timers,
                events: &mut self.events,
                now_ms,
            };
            ghost.behavior.reset(&mut ctx);
        }

        self.timers.cancel(&TimerKey::PacmanReset);
        self.pacman.cell = self.pacman.spawn;
        self.pacman.dir = Direction::None;
        self.pacman.alive = true;
        self.pacman.move_buffer = 0.0;
        self.pacman.tier = None;
        self.events.push(MatchEvent::StateReset);
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;

        self.process_timers(now_ms);
        if self.ended {
            return;
        }

        let pacman_before = self.pacman.cell;
        let ghosts_before: Vec<Cell> = self.ghosts.iter().map(|ghost| ghost.cell).collect();
        self.update_pacman(dt_ms);
        self.update_ghosts(dt_ms);
        self.resolve_collisions(now_ms, pacman_before, &ghosts_before);

        if self.tick_counter % TICK_RATE as u64 == 0 {
            debug!(
                tick = self.tick_counter,
                score_pacman = self.score_pacman,
                score_ghost = self.score_ghost,
                pellets = self.pellets_remaining(),
                "match progress"
            );
        }
        self.check_time_limit();
    }

    fn process_timers(&mut self, now_ms: u64) {
        while let Some((key, action)) = self.timers.pop_due(now_ms) {
            debug!(?key, ?action, now_ms, "timer fired");
            match action {
                TimerAction::ExpireMode { ghost_id, mode } => {
                    self.expire_ghost_mode(ghost_id, mode, now_ms)
                }
                TimerAction::FlashFrightened { ghost_id } => {
                    if let Some(ghost) = self.ghosts.get_mut(ghost_id) {
                        ghost.behavior.flash(&mut self.events);
                    }
                }
                TimerAction::ResetState => self.reset_state(),
                TimerAction::ResetGhostMultiplier => self.ghost_multiplier = 1,
            }
            if self.ended {
                return;
            }
        }
    }

    fn check_time_limit(&mut self) {
        if let Some(limit) = self.time_limit_ms {
            if self.elapsed_ms >= limit {
                self.end_match(MatchOutcome::Timeout);
            }
        }
    }

    fn end_match(&mut self, outcome: MatchOutcome) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.outcome = Some(outcome);
        self.timers.clear();
        self.events.push(MatchEvent::MatchEnded { outcome });
        info!(
            ?outcome,
            score_pacman = self.score_pacman,
            score_ghost = self.score_ghost,
            elapsed_ms = self.elapsed_ms,
            "match ended"
        );
    }

    pub fn pellets_remaining(&self) -> usize {
        self.pellets.iter().filter(|pellet| pellet.active).count()
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> MatchSnapshot {
        MatchSnapshot {
            tick: self.tick_counter,
            now_ms: self.elapsed_ms,
            time_left_ms: self
                .time_limit_ms
                .map(|limit| limit.saturating_sub(self.elapsed_ms)),
            round: self.round,
            score_pacman: self.score_pacman,
            score_ghost: self.score_ghost,
            pacman_lives: self.pacman_lives,
            ghost_multiplier: self.ghost_multiplier,
            experience_level: self.experience.level(),
            experience_total: self.experience.total(),
            pellets_remaining: self.pellets_remaining(),
            pacman: PacmanView {
                x: self.pacman.cell.x,
                y: self.pacman.cell.y,
                dir: self.pacman.dir,
                alive: self.pacman.alive,
                tier: self.pacman.tier,
            },
            ghosts: self
                .ghosts
                .iter()
                .enumerate()
                .map(|(id, ghost)| GhostView {
                    id,
                    name: ghost.stats.name.clone(),
                    x: ghost.cell.x,
                    y: ghost.cell.y,
                    dir: ghost.dir,
                    mode: ghost.behavior.active_mode(),
                    visual: ghost.behavior.visual(),
                    active: ghost.active,
                    lives: ghost.lives.current(),
                    max_lives: ghost.lives.max(),
                    speed_multiplier: ghost.behavior.speed_multiplier(),
                })
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> MatchSummary {
        MatchSummary {
            outcome: self.outcome.unwrap_or(MatchOutcome::Timeout),
            duration_ms: self.elapsed_ms,
            rounds: self.round,
            score_pacman: self.score_pacman,
            score_ghost: self.score_ghost,
            pellets_by_pacman: self.stats.pellets_by_pacman,
            pellets_by_ghosts: self.stats.pellets_by_ghosts,
            ghosts_eaten: self.stats.ghosts_eaten,
            pacman_deaths: self.stats.pacman_deaths,
            experience_level: self.experience.level(),
        }
    }

    /// Collects the active pellet at `cell`, if any, for Pacman or a ghost.
    fn collect_pellet(&mut self, cell: Cell, collector: Collector) {
        let Some(index) = self
            .pellets
            .iter()
            .position(|pellet| pellet.active && pellet.cell == cell)
        else {
            return;
        };
        self.pellets[index].active = false;
        let kind = self.pellets[index].kind;
        let points = match kind {
            PelletKind::Pellet => self.pellet_points,
            PelletKind::Power => self.power_pellet_points,
        };
        self.events.push(MatchEvent::PelletEaten {
            x: cell.x,
            y: cell.y,
            kind,
            by: collector,
        });

        match collector {
            Collector::Pacman => {
                self.score_pacman += points;
                self.stats.pellets_by_pacman += 1;
                if kind == PelletKind::Power {
                    self.frighten_ghosts(self.elapsed_ms);
                }
            }
            Collector::Ghost { .. } => {
                self.score_ghost += points;
                self.stats.pellets_by_ghosts += 1;
                self.experience.add(points, &mut self.events);
            }
        }

        if self.pellets_remaining() == 0 {
            for pellet in &mut self.pellets {
                pellet.active = true;
            }
            self.events.push(MatchEvent::PelletsRefilled);
            debug!(round = self.round, "pellets refilled");
        }
    }

    /// Power pellet: frightens every active ghost and re-arms the multiplier reset.
    fn frighten_ghosts(&mut self, now_ms: u64) {
        for ghost in &mut self.ghosts {
            if !ghost.active {
                continue;
            }
            let duration_ms = ghost.stats.frightened_duration_ms;
            let mut ctx = BehaviorContext {
                timers: &mut self.timers,
                events: &mut self.events,
                now_ms,
            };
            ghost.behavior.enable(GhostMode::Frightened, duration_ms, &mut ctx);
        }

        self.timers.cancel(&TimerKey::GhostMultiplierReset);
        let window_ms = self
            .ghosts
            .first()
            .map_or(0, |ghost| ghost.stats.frightened_duration_ms);
        if window_ms > 0 {
            self.timers.schedule(
                TimerKey::GhostMultiplierReset,
                now_ms + window_ms,
                TimerAction::ResetGhostMultiplier,
            );
        }
    }

    fn pacman_died(&mut self, now_ms: u64) {
        if !self.pacman.alive {
            return;
        }
        self.pacman.alive = false;
        self.pacman.dir = Direction::None;
        self.pacman.move_buffer = 0.0;
        self.pacman_lives = self.pacman_lives.saturating_sub(1);
        self.stats.pacman_deaths += 1;
        self.events.push(MatchEvent::PacmanDied {
            lives_left: self.pacman_lives,
        });
        info!(lives_left = self.pacman_lives, now_ms, "pacman died");

        if self.pacman_lives > 0 {
            self.timers.schedule(
                TimerKey::PacmanReset,
                now_ms + PACMAN_RESET_DELAY_MS,
                TimerAction::ResetState,
            );
        } else {
            self.end_match(MatchOutcome::GhostVictory);
        }
    }
}
