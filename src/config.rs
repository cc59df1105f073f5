use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{PACMAN_BASE_SPEED, PACMAN_START_LIVES, PELLET_POINTS, POWER_PELLET_POINTS};
use crate::error::{ConfigError, MazeError};
use crate::experience::ExperienceCurve;
use crate::grid::Maze;
use crate::types::GhostMode;
use crate::upgrades::{GhostCard, PlayerInventory, Shop, UpgradeCard, UpgradeCategory, UpgradeDatabase};

pub const DEFAULT_MAZE: [&str; 21] = [
    "###################",
    "#o.......#.......o#",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.###.#.###.####",
    "####.#...D...#.####",
    "####.#.##=##.#.####",
    "####...# G #...####",
    "####.#.#####.#.####",
    "####.#.......#.####",
    "####.#.#####.#.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#.....P.....#.o#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

/// Currency and purchases applied, in order, before the first game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySeed {
    pub currency: u64,
    pub purchases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub maze: Vec<String>,
    pub pacman_lives: u32,
    pub pacman_speed: f32,
    pub pellet_points: u32,
    pub power_pellet_points: u32,
    pub ghosts: Vec<GhostCard>,
    pub upgrades: Vec<Option<UpgradeCard>>,
    pub inventory: InventorySeed,
    pub experience_curve: ExperienceCurve,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            maze: DEFAULT_MAZE.iter().map(|row| row.to_string()).collect(),
            pacman_lives: PACMAN_START_LIVES,
            pacman_speed: PACMAN_BASE_SPEED,
            pellet_points: PELLET_POINTS,
            power_pellet_points: POWER_PELLET_POINTS,
            ghosts: default_ghosts(),
            upgrades: default_upgrades().into_iter().map(Some).collect(),
            inventory: InventorySeed::default(),
            experience_curve: ExperienceCurve::default(),
        }
    }
}

impl MatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), ghosts = config.ghosts.len(), "loaded match config");
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ghosts.is_empty() {
            return Err(ConfigError::NoGhosts);
        }
        self.build_maze()?;
        Ok(())
    }

    pub fn build_maze(&self) -> Result<Maze, MazeError> {
        Maze::parse(&self.maze)
    }

    /// Opens the shop and applies the seeded purchases; refused purchases are logged and skipped.
    pub fn build_shop(&self) -> Shop {
        let database = UpgradeDatabase::new(self.upgrades.clone());
        let mut shop = Shop::new(database, PlayerInventory::new(self.inventory.currency));
        for name in &self.inventory.purchases {
            if let Err(error) = shop.purchase_next(name) {
                warn!(name = %name, %error, "seeded purchase skipped");
            }
        }
        shop
    }
}

fn ghost(name: &str, initial_behavior: GhostMode, respawn_duration: i32) -> GhostCard {
    GhostCard {
        name: name.to_string(),
        initial_behavior,
        respawn_duration,
        ..GhostCard::default()
    }
}

pub fn default_ghosts() -> Vec<GhostCard> {
    vec![
        GhostCard {
            chase_speed_multiplier: 1.05,
            ..ghost("Blinky", GhostMode::Scatter, 3)
        },
        ghost("Pinky", GhostMode::Home, 2),
        GhostCard {
            lives: 2,
            ..ghost("Inky", GhostMode::Home, 5)
        },
        GhostCard {
            lives: 2,
            base_speed_multiplier: 0.9,
            ..ghost("Clyde", GhostMode::Home, 8)
        },
    ]
}

pub fn default_upgrades() -> Vec<UpgradeCard> {
    vec![
        UpgradeCard {
            name: "Thick Skin".to_string(),
            description: "Ghosts start with extra lives.".to_string(),
            category: UpgradeCategory::Lives,
            max_level: 3,
            costs: vec![50, 100, 200],
            health_increase: vec![1, 2, 3],
            ..UpgradeCard::default()
        },
        UpgradeCard {
            name: "Fleet Foot".to_string(),
            description: "Ghosts move faster.".to_string(),
            category: UpgradeCategory::Speed,
            max_level: 2,
            costs: vec![40, 90],
            base_speed_increase: vec![0.5, 1.0],
            ..UpgradeCard::default()
        },
        UpgradeCard {
            name: "Hunter Instinct".to_string(),
            description: "Longer and faster chases.".to_string(),
            category: UpgradeCategory::Chase,
            max_level: 2,
            costs: vec![60, 120],
            chase_duration_increase: vec![2, 4],
            chase_speed_multiplier_increase: vec![0.05, 0.1],
            ..UpgradeCard::default()
        },
        UpgradeCard {
            name: "Steady Nerves".to_string(),
            description: "Shorter, less sluggish frights.".to_string(),
            category: UpgradeCategory::Frightened,
            max_level: 2,
            costs: vec![80, 160],
            frightened_duration_decrease: vec![2, 4],
            frightened_speed_multiplier_increase: vec![0.1, 0.2],
            points_decrease: vec![50, 100],
            ..UpgradeCard::default()
        },
        UpgradeCard {
            name: "Quick Return".to_string(),
            description: "Eaten ghosts leave home sooner.".to_string(),
            category: UpgradeCategory::Respawn,
            max_level: 1,
            costs: vec![70],
            respawn_duration_decrease: vec![1],
            ..UpgradeCard::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MatchConfig::default();
        config.validate().expect("default config should validate");
        let maze = config.build_maze().expect("default maze");
        assert_eq!((maze.width, maze.height), (19, 21));
        assert_eq!(config.ghosts.len(), 4);
        assert!(config.build_shop().database().is_valid());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = MatchConfig::from_json_str(r#"{"pacmanLives":5,"inventory":{"currency":60}}"#)
            .expect("partial config should parse");
        assert_eq!(config.pacman_lives, 5);
        assert_eq!(config.pellet_points, PELLET_POINTS);
        assert_eq!(config.maze.len(), DEFAULT_MAZE.len());
        assert_eq!(config.inventory.currency, 60);
    }

    #[test]
    fn empty_ghost_list_is_rejected() {
        assert!(matches!(
            MatchConfig::from_json_str(r#"{"ghosts":[]}"#),
            Err(ConfigError::NoGhosts)
        ));
    }

    #[test]
    fn broken_maze_is_rejected() {
        assert!(matches!(
            MatchConfig::from_json_str("{\"maze\":[\"#####\",\"#...#\",\"#####\"]}"),
            Err(ConfigError::Maze(MazeError::MissingMarker(_)))
        ));
    }

    #[test]
    fn seeded_purchases_apply_in_order() {
        let config = MatchConfig {
            inventory: InventorySeed {
                currency: 200,
                purchases: vec![
                    "Thick Skin".to_string(),
                    "Thick Skin".to_string(),
                    "Unknown".to_string(),
                    "Fleet Foot".to_string(),
                ],
            },
            ..MatchConfig::default()
        };
        let shop = config.build_shop();
        assert_eq!(shop.inventory().current_level("Thick Skin"), 2);
        assert_eq!(shop.inventory().current_level("Fleet Foot"), 1);
        assert_eq!(shop.inventory().currency(), 10);
    }
}
