use tracing::warn;

use super::card::{GhostCard, StatDelta, UpgradeInstance};
use super::database::UpgradeDatabase;
use super::inventory::PlayerInventory;
use crate::constants::seconds_to_ms;
use crate::ghost_behavior::{ModeParameters, ModeTable};
use crate::types::GhostMode;

/// Upgrade-adjusted stats for one ghost, consumed when the ghost is built.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostStats {
    pub name: String,
    pub lives: u32,
    pub points: u32,
    pub initial_behavior: GhostMode,
    pub base_speed: f32,
    pub base_speed_multiplier: f32,
    pub chase_duration_ms: u64,
    pub chase_speed_multiplier: f32,
    pub pack_proximity: i32,
    pub respawn_duration_ms: u64,
    pub scatter_duration_ms: u64,
    pub scatter_speed_multiplier: f32,
    pub corner_proximity: i32,
    pub frightened_duration_ms: u64,
    pub frightened_speed_multiplier: f32,
}

impl GhostStats {
    pub fn from_card(card: &GhostCard, delta: &StatDelta) -> Self {
        Self {
            name: card.name.clone(),
            lives: (card.lives + delta.lives).max(1) as u32,
            points: (card.points + delta.points).max(0) as u32,
            initial_behavior: card.initial_behavior,
            base_speed: (card.base_speed + delta.base_speed).max(0.0),
            base_speed_multiplier: (card.base_speed_multiplier + delta.base_speed_multiplier)
                .max(0.0),
            chase_duration_ms: seconds_to_ms(card.chase_duration + delta.chase_duration),
            chase_speed_multiplier: (card.chase_speed_multiplier + delta.chase_speed_multiplier)
                .max(0.0),
            pack_proximity: card.pack_proximity + delta.pack_proximity,
            respawn_duration_ms: seconds_to_ms(card.respawn_duration + delta.respawn_duration),
            scatter_duration_ms: seconds_to_ms(card.scatter_duration + delta.scatter_duration),
            scatter_speed_multiplier: (card.scatter_speed_multiplier
                + delta.scatter_speed_multiplier)
                .max(0.0),
            corner_proximity: card.corner_proximity + delta.corner_proximity,
            frightened_duration_ms: seconds_to_ms(
                card.frightened_duration + delta.frightened_duration,
            ),
            frightened_speed_multiplier: (card.frightened_speed_multiplier
                + delta.frightened_speed_multiplier)
                .max(0.0),
        }
    }

    /// Home keeps the ghost parked, so its multiplier is neutral.
    pub fn mode_table(&self) -> ModeTable {
        ModeTable {
            home: ModeParameters {
                duration_ms: self.respawn_duration_ms,
                speed_multiplier: 1.0,
            },
            scatter: ModeParameters {
                duration_ms: self.scatter_duration_ms,
                speed_multiplier: self.scatter_speed_multiplier,
            },
            chase: ModeParameters {
                duration_ms: self.chase_duration_ms,
                speed_multiplier: self.chase_speed_multiplier,
            },
            frightened: ModeParameters {
                duration_ms: self.frightened_duration_ms,
                speed_multiplier: self.frightened_speed_multiplier,
            },
        }
    }

    pub fn speed(&self, mode_multiplier: f32) -> f32 {
        self.base_speed * self.base_speed_multiplier * mode_multiplier
    }
}

/// Sum of the deltas of every owned upgrade at its owned level.
pub fn owned_delta(database: &UpgradeDatabase, inventory: &PlayerInventory) -> StatDelta {
    let mut total = StatDelta::default();
    for (name, level) in inventory.owned_upgrades() {
        match database.by_name(name) {
            Some(card) => total += UpgradeInstance::new(card, level).deltas(),
            None => warn!(name, "owned upgrade is not in the database"),
        }
    }
    total
}

pub fn upgraded_stats(
    cards: &[GhostCard],
    database: &UpgradeDatabase,
    inventory: &PlayerInventory,
) -> Vec<GhostStats> {
    let delta = owned_delta(database, inventory);
    cards
        .iter()
        .map(|card| GhostStats::from_card(card, &delta))
        .collect()
}
