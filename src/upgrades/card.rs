use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::types::GhostMode;

/// Baseline stats of one ghost. Durations are whole seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GhostCard {
    pub name: String,
    pub description: String,
    pub lives: i32,
    pub points: i32,
    pub initial_behavior: GhostMode,
    pub base_speed: f32,
    pub base_speed_multiplier: f32,
    pub chase_duration: i32,
    pub chase_speed_multiplier: f32,
    pub pack_proximity: i32,
    pub respawn_duration: i32,
    pub scatter_duration: i32,
    pub scatter_speed_multiplier: f32,
    pub corner_proximity: i32,
    pub frightened_duration: i32,
    pub frightened_speed_multiplier: f32,
}

impl Default for GhostCard {
    fn default() -> Self {
        Self {
            name: "ghost".to_string(),
            description: String::new(),
            lives: 1,
            points: 200,
            initial_behavior: GhostMode::Scatter,
            base_speed: 7.0,
            base_speed_multiplier: 1.0,
            chase_duration: 20,
            chase_speed_multiplier: 1.0,
            pack_proximity: 0,
            respawn_duration: 3,
            scatter_duration: 7,
            scatter_speed_multiplier: 1.0,
            corner_proximity: 0,
            frightened_duration: 8,
            frightened_speed_multiplier: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeCategory {
    Lives,
    Points,
    Speed,
    Chase,
    Scatter,
    Frightened,
    Respawn,
}

impl UpgradeCategory {
    pub const ALL: [UpgradeCategory; 7] = [
        UpgradeCategory::Lives,
        UpgradeCategory::Points,
        UpgradeCategory::Speed,
        UpgradeCategory::Chase,
        UpgradeCategory::Scatter,
        UpgradeCategory::Frightened,
        UpgradeCategory::Respawn,
    ];
}

/// Immutable template of a permanent upgrade. Every per-level array is indexed by `level - 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpgradeCard {
    pub name: String,
    pub description: String,
    pub category: UpgradeCategory,
    pub max_level: i32,
    pub costs: Vec<i64>,
    pub health_increase: Vec<i32>,
    pub points_decrease: Vec<i32>,
    pub base_speed_increase: Vec<f32>,
    pub base_speed_multiplier_increase: Vec<f32>,
    pub chase_duration_increase: Vec<i32>,
    pub chase_speed_multiplier_increase: Vec<f32>,
    pub pack_proximity_increase: Vec<i32>,
    pub respawn_duration_decrease: Vec<i32>,
    pub scatter_duration_increase: Vec<i32>,
    pub scatter_speed_multiplier_increase: Vec<f32>,
    pub corner_proximity_increase: Vec<i32>,
    pub frightened_duration_decrease: Vec<i32>,
    pub frightened_speed_multiplier_increase: Vec<f32>,
}

impl Default for UpgradeCard {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: UpgradeCategory::Lives,
            max_level: 1,
            costs: Vec::new(),
            health_increase: Vec::new(),
            points_decrease: Vec::new(),
            base_speed_increase: Vec::new(),
            base_speed_multiplier_increase: Vec::new(),
            chase_duration_increase: Vec::new(),
            chase_speed_multiplier_increase: Vec::new(),
            pack_proximity_increase: Vec::new(),
            respawn_duration_decrease: Vec::new(),
            scatter_duration_increase: Vec::new(),
            scatter_speed_multiplier_increase: Vec::new(),
            corner_proximity_increase: Vec::new(),
            frightened_duration_decrease: Vec::new(),
            frightened_speed_multiplier_increase: Vec::new(),
        }
    }
}

impl UpgradeCard {
    /// Max level as an unsigned bound; a misconfigured non-positive value reads as 0.
    pub fn level_cap(&self) -> u32 {
        self.max_level.max(0) as u32
    }

    pub fn cost_for(&self, level: u32) -> Option<i64> {
        if level == 0 {
            return None;
        }
        self.costs.get(level as usize - 1).copied()
    }

    /// Stat changes granted at `level`, with decreases already negated.
    pub fn deltas_at(&self, level: u32) -> StatDelta {
        StatDelta {
            lives: at_level(&self.health_increase, level),
            points: -at_level(&self.points_decrease, level),
            base_speed: at_level(&self.base_speed_increase, level),
            base_speed_multiplier: at_level(&self.base_speed_multiplier_increase, level),
            chase_duration: at_level(&self.chase_duration_increase, level),
            chase_speed_multiplier: at_level(&self.chase_speed_multiplier_increase, level),
            pack_proximity: at_level(&self.pack_proximity_increase, level),
            respawn_duration: -at_level(&self.respawn_duration_decrease, level),
            scatter_duration: at_level(&self.scatter_duration_increase, level),
            scatter_speed_multiplier: at_level(&self.scatter_speed_multiplier_increase, level),
            corner_proximity: at_level(&self.corner_proximity_increase, level),
            frightened_duration: -at_level(&self.frightened_duration_decrease, level),
            frightened_speed_multiplier: at_level(
                &self.frightened_speed_multiplier_increase,
                level,
            ),
        }
    }
}

fn at_level<T: Copy + Default>(values: &[T], level: u32) -> T {
    if level == 0 {
        return T::default();
    }
    values
        .get(level as usize - 1)
        .copied()
        .unwrap_or_default()
}

/// Signed stat changes summed over owned upgrades.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatDelta {
    pub lives: i32,
    pub points: i32,
    pub base_speed: f32,
    pub base_speed_multiplier: f32,
    pub chase_duration: i32,
    pub chase_speed_multiplier: f32,
    pub pack_proximity: i32,
    pub respawn_duration: i32,
    pub scatter_duration: i32,
    pub scatter_speed_multiplier: f32,
    pub corner_proximity: i32,
    pub frightened_duration: i32,
    pub frightened_speed_multiplier: f32,
}

impl AddAssign for StatDelta {
    fn add_assign(&mut self, rhs: Self) {
        self.lives += rhs.lives;
        self.points += rhs.points;
        self.base_speed += rhs.base_speed;
        self.base_speed_multiplier += rhs.base_speed_multiplier;
        self.chase_duration += rhs.chase_duration;
        self.chase_speed_multiplier += rhs.chase_speed_multiplier;
        self.pack_proximity += rhs.pack_proximity;
        self.respawn_duration += rhs.respawn_duration;
        self.scatter_duration += rhs.scatter_duration;
        self.scatter_speed_multiplier += rhs.scatter_speed_multiplier;
        self.corner_proximity += rhs.corner_proximity;
        self.frightened_duration += rhs.frightened_duration;
        self.frightened_speed_multiplier += rhs.frightened_speed_multiplier;
    }
}

/// A card paired with the level the player owns.
#[derive(Clone, Copy, Debug)]
pub struct UpgradeInstance<'a> {
    card: &'a UpgradeCard,
    level: u32,
}

impl<'a> UpgradeInstance<'a> {
    pub fn new(card: &'a UpgradeCard, level: u32) -> Self {
        Self {
            card,
            level: level.min(card.level_cap()),
        }
    }

    pub fn card(&self) -> &'a UpgradeCard {
        self.card
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn deltas(&self) -> StatDelta {
        self.card.deltas_at(self.level)
    }

    /// Cost of the level after the current one; 0 at max level or for a short cost table.
    pub fn next_level_cost(&self) -> i64 {
        if self.is_max_level() {
            return 0;
        }
        self.card.cost_for(self.level + 1).unwrap_or(0)
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= self.card.level_cap()
    }
}

impl fmt::Display for UpgradeInstance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (level {}/{})",
            self.card.name, self.level, self.card.max_level
        )
    }
}
