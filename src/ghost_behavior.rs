use tracing::debug;

use crate::grid::Occupancy;
use crate::rng::SimRng;
use crate::scheduler::{MatchTimers, TimerAction, TimerKey};
use crate::types::{Cell, Direction, FrightenedVisual, GhostMode, MatchEvent, Point};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeParameters {
    /// Zero means the mode never expires on its own.
    pub duration_ms: u64,
    pub speed_multiplier: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeTable {
    pub home: ModeParameters,
    pub scatter: ModeParameters,
    pub chase: ModeParameters,
    pub frightened: ModeParameters,
}

impl ModeTable {
    pub fn get(&self, mode: GhostMode) -> ModeParameters {
        match mode {
            GhostMode::Home => self.home,
            GhostMode::Scatter => self.scatter,
            GhostMode::Chase => self.chase,
            GhostMode::Frightened => self.frightened,
        }
    }
}

/// What Frightened interrupted, restored verbatim when Frightened ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapturedMode {
    pub mode: GhostMode,
    pub remaining_ms: Option<u64>,
    pub speed_multiplier: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<GhostMode>,
    pub to: Option<GhostMode>,
}

pub struct BehaviorContext<'a> {
    pub timers: &'a mut MatchTimers,
    pub events: &'a mut Vec<MatchEvent>,
    pub now_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GhostBehavior {
    ghost_id: usize,
    modes: ModeTable,
    initial: GhostMode,
    active: Option<GhostMode>,
    speed_multiplier: f32,
    captured: Option<CapturedMode>,
    visual: FrightenedVisual,
}

impl GhostBehavior {
    pub fn new(ghost_id: usize, modes: ModeTable, initial: GhostMode) -> Self {
        Self {
            ghost_id,
            modes,
            initial,
            active: None,
            speed_multiplier: 1.0,
            captured: None,
            visual: FrightenedVisual::Steady,
        }
    }

    pub fn active_mode(&self) -> Option<GhostMode> {
        self.active
    }

    pub fn is(&self, mode: GhostMode) -> bool {
        self.active == Some(mode)
    }

    pub fn initial_mode(&self) -> GhostMode {
        self.initial
    }

    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn captured(&self) -> Option<CapturedMode> {
        self.captured
    }

    pub fn visual(&self) -> FrightenedVisual {
        self.visual
    }

    /// Enables `mode` with its configured duration.
    pub fn enable_default(&mut self, mode: GhostMode, ctx: &mut BehaviorContext<'_>) {
        let duration_ms = self.modes.get(mode).duration_ms;
        self.enable(mode, duration_ms, ctx);
    }

    /// Enables `mode`, implicitly disabling whatever was active.
    pub fn enable(&mut self, mode: GhostMode, duration_ms: u64, ctx: &mut BehaviorContext<'_>) {
        if mode == GhostMode::Frightened {
            self.enable_frightened(duration_ms, ctx);
            return;
        }

        let from = self.active;
        self.cancel_timers(ctx.timers);
        self.captured = None;
        self.visual = FrightenedVisual::Steady;
        self.active = Some(mode);
        self.speed_multiplier = self.modes.get(mode).speed_multiplier;
        self.arm_expiry(mode, duration_ms, ctx);
        ctx.events.push(MatchEvent::GhostModeChanged {
            ghost_id: self.ghost_id,
            from,
            to: mode,
        });
    }

    fn enable_frightened(&mut self, duration_ms: u64, ctx: &mut BehaviorContext<'_>) {
        let from = self.active;
        if from != Some(GhostMode::Frightened) {
            self.captured = from.map(|mode| CapturedMode {
                mode,
                remaining_ms: ctx
                    .timers
                    .remaining(&TimerKey::GhostMode(self.ghost_id), ctx.now_ms),
                speed_multiplier: self.speed_multiplier,
            });
        }

        self.cancel_timers(ctx.timers);
        self.active = Some(GhostMode::Frightened);
        self.speed_multiplier = self.modes.frightened.speed_multiplier;
        self.visual = FrightenedVisual::Steady;
        self.arm_expiry(GhostMode::Frightened, duration_ms, ctx);
        if duration_ms > 0 {
            ctx.timers.schedule(
                TimerKey::GhostFlash(self.ghost_id),
                ctx.now_ms + duration_ms / 2,
                TimerAction::FlashFrightened {
                    ghost_id: self.ghost_id,
                },
            );
        }
        ctx.events.push(MatchEvent::GhostModeChanged {
            ghost_id: self.ghost_id,
            from,
            to: GhostMode::Frightened,
        });
    }

    /// Disables `mode` if it is the active one and moves on to the next mode of the cycle.
    pub fn disable(&mut self, mode: GhostMode, ctx: &mut BehaviorContext<'_>) -> Option<Transition> {
        if self.active != Some(mode) {
            return None;
        }

        let to = match mode {
            GhostMode::Frightened => self.restore_captured(ctx),
            GhostMode::Scatter => {
                self.enable_default(GhostMode::Chase, ctx);
                GhostMode::Chase
            }
            GhostMode::Chase | GhostMode::Home => {
                self.enable_default(GhostMode::Scatter, ctx);
                GhostMode::Scatter
            }
        };
        Some(Transition {
            from: Some(mode),
            to: Some(to),
        })
    }

    fn restore_captured(&mut self, ctx: &mut BehaviorContext<'_>) -> GhostMode {
        let Some(previous) = self.captured.take() else {
            self.enable_default(GhostMode::Scatter, ctx);
            return GhostMode::Scatter;
        };

        self.cancel_timers(ctx.timers);
        self.visual = FrightenedVisual::Steady;
        self.active = Some(previous.mode);
        self.speed_multiplier = previous.speed_multiplier;
        if let Some(remaining_ms) = previous.remaining_ms {
            ctx.timers.schedule(
                TimerKey::GhostMode(self.ghost_id),
                ctx.now_ms + remaining_ms,
                TimerAction::ExpireMode {
                    ghost_id: self.ghost_id,
                    mode: previous.mode,
                },
            );
        }
        ctx.events.push(MatchEvent::GhostModeChanged {
            ghost_id: self.ghost_id,
            from: Some(GhostMode::Frightened),
            to: previous.mode,
        });
        previous.mode
    }

    /// Handles an expiry timer; a timer for a mode that is no longer active is ignored.
    pub fn expire(&mut self, mode: GhostMode, ctx: &mut BehaviorContext<'_>) -> Option<Transition> {
        if self.active != Some(mode) {
            debug!(
                ghost_id = self.ghost_id,
                ?mode,
                active = ?self.active,
                "ignoring stale mode timer"
            );
            return None;
        }
        self.disable(mode, ctx)
    }

    pub fn flash(&mut self, events: &mut Vec<MatchEvent>) {
        if self.active != Some(GhostMode::Frightened) || self.visual == FrightenedVisual::Flashing
        {
            return;
        }
        self.visual = FrightenedVisual::Flashing;
        events.push(MatchEvent::FrightenedFlashing {
            ghost_id: self.ghost_id,
        });
    }

    /// Back to the initial behavior with no pending timers or captured state.
    pub fn reset(&mut self, ctx: &mut BehaviorContext<'_>) {
        self.cancel_timers(ctx.timers);
        self.captured = None;
        self.visual = FrightenedVisual::Steady;
        self.active = None;
        self.enable_default(self.initial, ctx);
    }

    pub fn deactivate(&mut self, timers: &mut MatchTimers) {
        self.cancel_timers(timers);
        self.captured = None;
        self.visual = FrightenedVisual::Steady;
        self.active = None;
    }

    pub fn choose_direction<O: Occupancy>(
        &self,
        node: &O,
        position: Cell,
        heading: Direction,
        pacman: Point,
        rng: &mut SimRng,
    ) -> Direction {
        let Some(mode) = self.active else {
            return Direction::None;
        };
        let open = node.available_directions();
        match mode {
            GhostMode::Home => Direction::None,
            GhostMode::Frightened => farthest_from(&open, position, pacman),
            GhostMode::Chase => {
                let options = forward_options(&open, heading);
                closest_to(&options, position, pacman)
            }
            GhostMode::Scatter => {
                let options = forward_options(&open, heading);
                rng.pick(&options).unwrap_or(Direction::None)
            }
        }
    }

    /// A zero duration leaves the mode untimed, except Home, which then releases on the next tick.
    fn arm_expiry(&self, mode: GhostMode, duration_ms: u64, ctx: &mut BehaviorContext<'_>) {
        if duration_ms == 0 && mode != GhostMode::Home {
            return;
        }
        ctx.timers.schedule(
            TimerKey::GhostMode(self.ghost_id),
            ctx.now_ms + duration_ms,
            TimerAction::ExpireMode {
                ghost_id: self.ghost_id,
                mode,
            },
        );
    }

    fn cancel_timers(&self, timers: &mut MatchTimers) {
        timers.cancel(&TimerKey::GhostMode(self.ghost_id));
        timers.cancel(&TimerKey::GhostFlash(self.ghost_id));
    }
}

fn forward_options(open: &[Direction], heading: Direction) -> Vec<Direction> {
    let forward: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| *dir != heading.opposite() || heading.is_none())
        .collect();
    if forward.is_empty() {
        open.to_vec()
    } else {
        forward
    }
}

fn farthest_from(options: &[Direction], position: Cell, target: Point) -> Direction {
    let origin = Point::from(position);
    let mut best = Direction::None;
    let mut best_distance = f32::MIN;
    for dir in options {
        let distance = origin.step(*dir).sqr_distance(target);
        if distance > best_distance {
            best_distance = distance;
            best = *dir;
        }
    }
    best
}

fn closest_to(options: &[Direction], position: Cell, target: Point) -> Direction {
    let origin = Point::from(position);
    let mut best = Direction::None;
    let mut best_distance = f32::MAX;
    for dir in options {
        let distance = origin.step(*dir).sqr_distance(target);
        if distance < best_distance {
            best_distance = distance;
            best = *dir;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OpenNode(Vec<Direction>);

    impl Occupancy for OpenNode {
        fn occupied(&self, dir: Direction) -> bool {
            !self.0.contains(&dir)
        }
    }

    fn table() -> ModeTable {
        ModeTable {
            home: ModeParameters {
                duration_ms: 3_000,
                speed_multiplier: 1.0,
            },
            scatter: ModeParameters {
                duration_ms: 7_000,
                speed_multiplier: 0.9,
            },
            chase: ModeParameters {
                duration_ms: 20_000,
                speed_multiplier: 1.1,
            },
            frightened: ModeParameters {
                duration_ms: 8_000,
                speed_multiplier: 0.5,
            },
        }
    }

    struct Harness {
        timers: MatchTimers,
        events: Vec<MatchEvent>,
        now_ms: u64,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                timers: MatchTimers::new(),
                events: Vec::new(),
                now_ms: 0,
            }
        }

        fn ctx(&mut self) -> BehaviorContext<'_> {
            BehaviorContext {
                timers: &mut self.timers,
                events: &mut self.events,
                now_ms: self.now_ms,
            }
        }

        /// Advances time and routes due timers to the ghost, like the match loop does.
        fn advance(&mut self, ghost: &mut GhostBehavior, to_ms: u64) {
            self.now_ms = to_ms;
            while let Some((_, action)) = self.timers.pop_due(to_ms) {
                match action {
                    TimerAction::ExpireMode { mode, .. } => {
                        let mut ctx = self.ctx();
                        ghost.expire(mode, &mut ctx);
                    }
                    TimerAction::FlashFrightened { .. } => ghost.flash(&mut self.events),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn zero_home_duration_releases_on_next_tick() {
        let mut h = Harness::new();
        let mut modes = table();
        modes.home.duration_ms = 0;
        let mut ghost = GhostBehavior::new(0, modes, GhostMode::Home);
        ghost.reset(&mut h.ctx());
        assert!(ghost.is(GhostMode::Home));
        assert_eq!(h.timers.remaining(&TimerKey::GhostMode(0), 0), Some(0));

        h.advance(&mut ghost, 50);
        assert!(ghost.is(GhostMode::Scatter));
    }

    #[test]
    fn reset_enables_initial_mode_only() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Home);
        ghost.reset(&mut h.ctx());
        assert_eq!(ghost.active_mode(), Some(GhostMode::Home));
        assert!(h.timers.is_pending(&TimerKey::GhostMode(0)));
    }

    #[test]
    fn scatter_and_chase_alternate_on_expiry() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Scatter);
        ghost.reset(&mut h.ctx());

        h.advance(&mut ghost, 6_999);
        assert!(ghost.is(GhostMode::Scatter));
        h.advance(&mut ghost, 7_000);
        assert!(ghost.is(GhostMode::Chase));
        assert_eq!(ghost.speed_multiplier(), 1.1);
        h.advance(&mut ghost, 27_000);
        assert!(ghost.is(GhostMode::Scatter));
    }

    #[test]
    fn frightened_restores_prior_mode_timing_and_speed() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Chase);
        ghost.reset(&mut h.ctx());

        h.advance(&mut ghost, 5_000);
        ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());
        assert_eq!(
            ghost.captured(),
            Some(CapturedMode {
                mode: GhostMode::Chase,
                remaining_ms: Some(15_000),
                speed_multiplier: 1.1,
            })
        );
        assert_eq!(ghost.speed_multiplier(), 0.5);

        h.advance(&mut ghost, 13_000);
        assert!(ghost.is(GhostMode::Chase));
        assert_eq!(ghost.speed_multiplier(), 1.1);
        assert_eq!(h.timers.remaining(&TimerKey::GhostMode(0), 13_000), Some(15_000));

        h.advance(&mut ghost, 27_999);
        assert!(ghost.is(GhostMode::Chase));
        h.advance(&mut ghost, 28_000);
        assert!(ghost.is(GhostMode::Scatter));
    }

    #[test]
    fn refrightening_keeps_first_capture() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Scatter);
        ghost.reset(&mut h.ctx());

        h.advance(&mut ghost, 1_000);
        ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());
        h.advance(&mut ghost, 5_000);
        ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());

        let captured = ghost.captured().expect("capture kept");
        assert_eq!(captured.mode, GhostMode::Scatter);
        assert_eq!(captured.remaining_ms, Some(6_000));

        h.advance(&mut ghost, 12_999);
        assert!(ghost.is(GhostMode::Frightened));
        h.advance(&mut ghost, 13_000);
        assert!(ghost.is(GhostMode::Scatter));
    }

    #[test]
    fn flash_triggers_at_half_duration_without_changing_mode() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Scatter);
        ghost.reset(&mut h.ctx());
        ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());

        h.advance(&mut ghost, 3_999);
        assert_eq!(ghost.visual(), FrightenedVisual::Steady);
        h.advance(&mut ghost, 4_000);
        assert_eq!(ghost.visual(), FrightenedVisual::Flashing);
        assert!(ghost.is(GhostMode::Frightened));
    }

    #[test]
    fn forcing_home_drops_frightened_capture_and_flash() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Chase);
        ghost.reset(&mut h.ctx());
        ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());

        h.advance(&mut ghost, 1_000);
        ghost.enable_default(GhostMode::Home, &mut h.ctx());
        assert!(ghost.captured().is_none());
        assert!(!h.timers.is_pending(&TimerKey::GhostFlash(0)));

        h.advance(&mut ghost, 4_000);
        assert!(ghost.is(GhostMode::Scatter));
        assert_eq!(ghost.visual(), FrightenedVisual::Steady);
    }

    #[test]
    fn exactly_one_mode_is_active_after_every_transition() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Scatter);
        ghost.reset(&mut h.ctx());
        for step in 1..=200u64 {
            if step % 37 == 0 {
                ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());
            }
            if step % 91 == 0 {
                ghost.enable_default(GhostMode::Home, &mut h.ctx());
            }
            h.advance(&mut ghost, step * 500);
            assert!(ghost.active_mode().is_some());
        }
    }

    #[test]
    fn stale_expiry_is_ignored() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Chase);
        ghost.reset(&mut h.ctx());
        assert!(ghost.expire(GhostMode::Scatter, &mut h.ctx()).is_none());
        assert!(ghost.is(GhostMode::Chase));
    }

    #[test]
    fn deactivated_ghost_has_no_mode_or_timers() {
        let mut h = Harness::new();
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Chase);
        ghost.reset(&mut h.ctx());
        ghost.deactivate(&mut h.timers);
        assert_eq!(ghost.active_mode(), None);
        assert!(h.timers.is_empty());
    }

    #[test]
    fn frightened_runs_to_the_farthest_open_cell() {
        let mut h = Harness::new();
        let mut rng = SimRng::new(1);
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Scatter);
        ghost.reset(&mut h.ctx());
        ghost.enable(GhostMode::Frightened, 8_000, &mut h.ctx());

        let node = OpenNode(vec![Direction::Up, Direction::Left, Direction::Right]);
        let dir = ghost.choose_direction(
            &node,
            Cell::new(5, 5),
            Direction::Left,
            Point::new(8.0, 5.0),
            &mut rng,
        );
        assert_eq!(dir, Direction::Left);
    }

    #[test]
    fn chase_closes_distance_without_reversing() {
        let mut h = Harness::new();
        let mut rng = SimRng::new(1);
        let mut ghost = GhostBehavior::new(0, table(), GhostMode::Chase);
        ghost.reset(&mut h.ctx());

        let node = OpenNode(vec![Direction::Up, Direction::Down, Direction::Right]);
        let dir = ghost.choose_direction(
            &node,
            Cell::new(5, 5),
            Direction::Up,
            Point::new(5.0, 9.0),
            &mut rng,
        );
        assert_eq!(dir, Direction::Right);
    }
}
