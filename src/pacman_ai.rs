use tracing::debug;

use crate::constants::{
    danger_factor, CHASE_HYSTERESIS_BONUS, CHASE_TRIGGER_DISTANCE, COLLECT_HYSTERESIS_BONUS,
    CORRIDOR_MAX_OPEN_DIRECTIONS, DANGER_WEIGHT, FLEE_HYSTERESIS_BONUS, FLEE_TRIGGER_DISTANCE,
    GHOST_AHEAD_ALIGNMENT, SAFE_PELLET_DISTANCE,
};
use crate::grid::Occupancy;
use crate::types::{DecisionTier, Direction, GhostMode, Point};

/// What Pacman can see of one ghost on a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostSighting {
    pub position: Point,
    /// `None` for a ghost that is off the field for good.
    pub mode: Option<GhostMode>,
}

impl GhostSighting {
    pub fn is_dangerous(&self) -> bool {
        matches!(self.mode, Some(GhostMode::Scatter) | Some(GhostMode::Chase))
    }

    pub fn is_edible(&self) -> bool {
        self.mode == Some(GhostMode::Frightened)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DecisionInput<'a> {
    pub position: Point,
    pub heading: Direction,
    pub ghosts: &'a [GhostSighting],
    /// Positions of the pellets that are still active.
    pub pellets: &'a [Point],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub tier: DecisionTier,
    pub direction: Direction,
}

/// Picks Pacman's direction for this tick: Flee, then Chase-frightened, then Collect.
pub fn decide<O: Occupancy>(node: &O, input: &DecisionInput<'_>) -> Decision {
    let open = node.available_directions();
    let scan = Scan {
        open: &open,
        position: input.position,
        heading: input.heading,
    };

    if let Some(direction) = try_flee(&scan, input) {
        debug!(?direction, "pacman flees");
        return Decision {
            tier: DecisionTier::Flee,
            direction,
        };
    }
    if let Some(direction) = try_chase(&scan, input) {
        debug!(?direction, "pacman chases a frightened ghost");
        return Decision {
            tier: DecisionTier::ChaseFrightened,
            direction,
        };
    }
    Decision {
        tier: DecisionTier::Collect,
        direction: collect(&scan, input),
    }
}

struct Scan<'a> {
    open: &'a [Direction],
    position: Point,
    heading: Direction,
}

impl Scan<'_> {
    fn in_corridor(&self) -> bool {
        self.open.len() <= CORRIDOR_MAX_OPEN_DIRECTIONS
    }

    /// Corridors forbid turning back, except at a dead end: with one open direction Pacman
    /// reverses instead of idling against the wall.
    fn is_forbidden_reversal(&self, dir: Direction) -> bool {
        !self.heading.is_none()
            && dir == self.heading.opposite()
            && self.in_corridor()
            && self.open.len() > 1
    }

    /// Argmax over open directions in scan order; the first strict maximum wins.
    ///
    /// Starts from the current heading so a fully filtered scan keeps going straight.
    /// Returns `None` only when Pacman is stopped and nothing qualified.
    fn best<F>(&self, allow_reversal: bool, bonus: f32, mut score: F) -> Option<Direction>
    where
        F: FnMut(Point) -> f32,
    {
        let mut best = self.heading;
        let mut best_score = f32::MIN;
        for dir in self.open.iter().copied() {
            if !allow_reversal && self.is_forbidden_reversal(dir) {
                continue;
            }
            let mut value = score(self.position.step(dir));
            if dir == self.heading {
                value += bonus;
            }
            if value > best_score {
                best_score = value;
                best = dir;
            }
        }
        (!best.is_none()).then_some(best)
    }
}

fn nearest<'a, I>(from: Point, ghosts: I) -> Option<(Point, f32)>
where
    I: Iterator<Item = &'a GhostSighting>,
{
    let mut found: Option<(Point, f32)> = None;
    for ghost in ghosts {
        let distance = from.distance(ghost.position);
        if found.map_or(true, |(_, best)| distance < best) {
            found = Some((ghost.position, distance));
        }
    }
    found
}

fn try_flee(scan: &Scan<'_>, input: &DecisionInput<'_>) -> Option<Direction> {
    let (ghost, distance) = nearest(
        input.position,
        input.ghosts.iter().filter(|g| g.is_dangerous()),
    )?;
    if distance >= FLEE_TRIGGER_DISTANCE {
        return None;
    }

    let ghost_ahead = input.position.alignment(ghost, input.heading) > GHOST_AHEAD_ALIGNMENT;
    scan.best(ghost_ahead, FLEE_HYSTERESIS_BONUS, |next| next.distance(ghost))
}

fn try_chase(scan: &Scan<'_>, input: &DecisionInput<'_>) -> Option<Direction> {
    let (ghost, distance) =
        nearest(input.position, input.ghosts.iter().filter(|g| g.is_edible()))?;
    if distance >= CHASE_TRIGGER_DISTANCE {
        return None;
    }
    scan.best(false, CHASE_HYSTERESIS_BONUS, |next| -next.distance(ghost))
}

fn collect(scan: &Scan<'_>, input: &DecisionInput<'_>) -> Direction {
    let Some(target) = target_pellet(input) else {
        return input.heading;
    };
    scan.best(false, COLLECT_HYSTERESIS_BONUS, |next| {
        -next.distance(target) - danger_at(next, input.ghosts) * DANGER_WEIGHT
    })
    .unwrap_or(input.heading)
}

/// Nearest pellet with no dangerous ghost close to it, else the nearest pellet at all.
pub fn target_pellet(input: &DecisionInput<'_>) -> Option<Point> {
    let is_safe = |pellet: Point| {
        !input
            .ghosts
            .iter()
            .any(|g| g.is_dangerous() && pellet.distance(g.position) < SAFE_PELLET_DISTANCE)
    };

    let mut nearest_safe: Option<(Point, f32)> = None;
    let mut nearest_any: Option<(Point, f32)> = None;
    for pellet in input.pellets.iter().copied() {
        let distance = input.position.distance(pellet);
        if nearest_any.map_or(true, |(_, best)| distance < best) {
            nearest_any = Some((pellet, distance));
        }
        if is_safe(pellet) && nearest_safe.map_or(true, |(_, best)| distance < best) {
            nearest_safe = Some((pellet, distance));
        }
    }
    nearest_safe.or(nearest_any).map(|(pellet, _)| pellet)
}

fn danger_at(position: Point, ghosts: &[GhostSighting]) -> f32 {
    match nearest(position, ghosts.iter().filter(|g| g.is_dangerous())) {
        Some((_, distance)) => danger_factor(distance),
        None => 0.0,
    }
}
