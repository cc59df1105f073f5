use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::card::UpgradeCard;
use crate::error::PurchaseError;

/// Currency plus owned upgrade levels, keyed by card name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInventory {
    currency: u64,
    owned: BTreeMap<String, u32>,
}

impl PlayerInventory {
    pub fn new(currency: u64) -> Self {
        Self {
            currency,
            owned: BTreeMap::new(),
        }
    }

    pub fn currency(&self) -> u64 {
        self.currency
    }

    pub fn current_level(&self, name: &str) -> u32 {
        self.owned.get(name).copied().unwrap_or(0)
    }

    pub fn owns(&self, name: &str) -> bool {
        self.current_level(name) > 0
    }

    pub fn is_max_level(&self, card: &UpgradeCard) -> bool {
        self.current_level(&card.name) >= card.level_cap()
    }

    pub fn owned_upgrades(&self) -> impl Iterator<Item = (&str, u32)> {
        self.owned.iter().map(|(name, level)| (name.as_str(), *level))
    }

    /// Returns the cost the purchase would charge, or why it is refused.
    pub fn check_purchase(&self, card: &UpgradeCard, target_level: u32) -> Result<u64, PurchaseError> {
        let current = self.current_level(&card.name);
        if target_level != current + 1 {
            return Err(PurchaseError::WrongLevel {
                current,
                target: target_level,
            });
        }
        if target_level > card.level_cap() {
            return Err(PurchaseError::AboveMaxLevel {
                target: target_level,
                max: card.level_cap(),
            });
        }
        let cost = card
            .cost_for(target_level)
            .ok_or_else(|| PurchaseError::MissingCost {
                name: card.name.clone(),
                level: target_level,
            })?;
        if cost < 0 {
            return Err(PurchaseError::NegativeCost {
                name: card.name.clone(),
                cost,
            });
        }
        let cost = cost as u64;
        if self.currency < cost {
            return Err(PurchaseError::InsufficientFunds {
                available: self.currency,
                cost,
            });
        }
        Ok(cost)
    }

    pub fn can_purchase(&self, card: &UpgradeCard, target_level: u32) -> bool {
        self.check_purchase(card, target_level).is_ok()
    }

    /// Charges the cost and records the level, or leaves the inventory untouched.
    pub fn try_purchase(&mut self, card: &UpgradeCard, target_level: u32) -> Result<u64, PurchaseError> {
        let cost = self.check_purchase(card, target_level)?;
        self.currency -= cost;
        self.owned.insert(card.name.clone(), target_level);
        info!(
            name = %card.name,
            level = target_level,
            cost,
            remaining = self.currency,
            "upgrade purchased"
        );
        Ok(cost)
    }

    pub fn purchase_upgrade(&mut self, card: &UpgradeCard, target_level: u32) -> bool {
        match self.try_purchase(card, target_level) {
            Ok(_) => true,
            Err(error) => {
                warn!(name = %card.name, level = target_level, %error, "purchase refused");
                false
            }
        }
    }

    pub fn add_currency(&mut self, amount: u64) {
        self.currency = self.currency.saturating_add(amount);
    }

    pub fn remove_currency(&mut self, amount: u64) {
        self.currency = self.currency.saturating_sub(amount);
    }

    pub fn set_currency(&mut self, amount: u64) {
        self.currency = amount;
    }

    pub fn reset(&mut self) {
        self.currency = 0;
        self.owned.clear();
        warn!("inventory reset");
    }

    /// Sets a level without charging; the level is clamped to `1..=max_level`.
    pub fn grant_level(&mut self, card: &UpgradeCard, level: u32) {
        let cap = card.level_cap();
        if cap == 0 {
            warn!(name = %card.name, "cannot grant a level of an upgrade with no levels");
            return;
        }
        let level = level.clamp(1, cap);
        self.owned.insert(card.name.clone(), level);
        warn!(name = %card.name, level, "upgrade granted without purchase");
    }
}
