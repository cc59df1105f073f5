use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Scan order used by every direction choice; the first best score wins ties.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Direction::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx as f32,
            y: self.y + dy as f32,
        }
    }

    pub fn sqr_distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f32 {
        self.sqr_distance(other).sqrt()
    }

    /// Cosine between `dir` and the vector from `self` to `target`; zero for a degenerate vector.
    pub fn alignment(self, target: Point, dir: Direction) -> f32 {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            return 0.0;
        }
        let (ux, uy) = dir.delta();
        (dx * ux as f32 + dy * uy as f32) / len
    }
}

impl From<Cell> for Point {
    fn from(cell: Cell) -> Self {
        Self {
            x: cell.x as f32,
            y: cell.y as f32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Home,
    Scatter,
    Chase,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrightenedVisual {
    Steady,
    Flashing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PelletKind {
    Pellet,
    Power,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Collector {
    Pacman,
    Ghost {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    PacmanVictory,
    GhostVictory,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTier {
    Flee,
    ChaseFrightened,
    Collect,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    RoundStarted {
        round: u32,
    },
    StateReset,
    GhostModeChanged {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
        from: Option<GhostMode>,
        to: GhostMode,
    },
    FrightenedFlashing {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    GhostLivesChanged {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
        lives: u32,
        #[serde(rename = "maxLives")]
        max_lives: u32,
    },
    GhostDied {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    GhostRespawning {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
        points: u32,
        multiplier: u32,
    },
    PelletEaten {
        x: i32,
        y: i32,
        kind: PelletKind,
        by: Collector,
    },
    PelletsRefilled,
    PacmanDied {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    ExperienceLevelUp {
        level: u32,
    },
    MatchEnded {
        outcome: MatchOutcome,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PacmanView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub alive: bool,
    pub tier: Option<DecisionTier>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub mode: Option<GhostMode>,
    pub visual: FrightenedVisual,
    pub active: bool,
    pub lives: u32,
    #[serde(rename = "maxLives")]
    pub max_lives: u32,
    #[serde(rename = "speedMultiplier")]
    pub speed_multiplier: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    #[serde(rename = "timeLeftMs")]
    pub time_left_ms: Option<u64>,
    pub round: u32,
    #[serde(rename = "scorePacman")]
    pub score_pacman: u32,
    #[serde(rename = "scoreGhost")]
    pub score_ghost: u32,
    #[serde(rename = "pacmanLives")]
    pub pacman_lives: u32,
    #[serde(rename = "ghostMultiplier")]
    pub ghost_multiplier: u32,
    #[serde(rename = "experienceLevel")]
    pub experience_level: u32,
    #[serde(rename = "experienceTotal")]
    pub experience_total: u32,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: usize,
    pub pacman: PacmanView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<MatchEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchSummary {
    pub outcome: MatchOutcome,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub rounds: u32,
    #[serde(rename = "scorePacman")]
    pub score_pacman: u32,
    #[serde(rename = "scoreGhost")]
    pub score_ghost: u32,
    #[serde(rename = "pelletsByPacman")]
    pub pellets_by_pacman: u32,
    #[serde(rename = "pelletsByGhosts")]
    pub pellets_by_ghosts: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "pacmanDeaths")]
    pub pacman_deaths: u32,
    #[serde(rename = "experienceLevel")]
    pub experience_level: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn alignment_is_cosine_to_target() {
        let origin = Point::new(0.0, 0.0);
        assert!((origin.alignment(Point::new(3.0, 0.0), Direction::Right) - 1.0).abs() < 1e-6);
        assert!((origin.alignment(Point::new(-3.0, 0.0), Direction::Right) + 1.0).abs() < 1e-6);
        assert_eq!(origin.alignment(origin, Direction::Right), 0.0);
        assert_eq!(origin.alignment(Point::new(0.0, 2.0), Direction::None), 0.0);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = MatchEvent::GhostEaten {
            ghost_id: 2,
            points: 400,
            multiplier: 2,
        };
        let json = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(json["type"], "ghost_eaten");
        assert_eq!(json["ghostId"], 2);
    }
}
