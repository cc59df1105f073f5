use std::collections::HashSet;

use tracing::{error, info, warn};

use super::card::{UpgradeCard, UpgradeCategory};

/// Catalogue of every permanent upgrade. Entries may be `None` when loaded from a
/// misconfigured source; validation reports them.
#[derive(Clone, Debug, Default)]
pub struct UpgradeDatabase {
    upgrades: Vec<Option<UpgradeCard>>,
    valid: Option<bool>,
}

impl UpgradeDatabase {
    pub fn new(upgrades: Vec<Option<UpgradeCard>>) -> Self {
        Self {
            upgrades,
            valid: None,
        }
    }

    pub fn from_cards(cards: Vec<UpgradeCard>) -> Self {
        Self::new(cards.into_iter().map(Some).collect())
    }

    pub fn all(&self) -> impl Iterator<Item = &UpgradeCard> {
        self.upgrades.iter().flatten()
    }

    pub fn by_category(&self, category: UpgradeCategory) -> Vec<&UpgradeCard> {
        self.all().filter(|card| card.category == category).collect()
    }

    pub fn by_name(&self, name: &str) -> Option<&UpgradeCard> {
        if name.is_empty() {
            return None;
        }
        self.all().find(|card| card.name == name)
    }

    pub fn by_index(&self, index: usize) -> Option<&UpgradeCard> {
        match self.upgrades.get(index) {
            Some(entry) => entry.as_ref(),
            None => {
                warn!(
                    index,
                    len = self.upgrades.len(),
                    "upgrade index out of range"
                );
                None
            }
        }
    }

    /// Number of entries, including empty slots.
    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    pub fn count_by_category(&self, category: UpgradeCategory) -> usize {
        self.all().filter(|card| card.category == category).count()
    }

    /// `None` until the first `validate`; every later edit revalidates.
    pub fn validation_state(&self) -> Option<bool> {
        self.valid
    }

    pub fn is_valid(&self) -> bool {
        self.valid == Some(true)
    }

    /// Checks every entry, logs each problem and caches the verdict.
    pub fn validate(&mut self) -> bool {
        let mut valid = true;

        if self.upgrades.is_empty() {
            warn!("upgrade database is empty");
            valid = false;
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.upgrades.iter().enumerate() {
            let Some(card) = entry else {
                warn!(index, "upgrade database contains an empty entry");
                valid = false;
                continue;
            };

            if card.name.is_empty() {
                error!(index, "upgrade has no name");
                valid = false;
            } else if !seen.insert(card.name.as_str()) {
                warn!(name = %card.name, "upgrade database contains a duplicate");
                valid = false;
            }

            if card.max_level <= 0 {
                error!(
                    name = %card.name,
                    max_level = card.max_level,
                    "max level must be positive"
                );
                valid = false;
            }

            if card.costs.len() as i64 != card.max_level as i64 {
                error!(
                    name = %card.name,
                    costs = card.costs.len(),
                    max_level = card.max_level,
                    "cost table size does not match max level"
                );
                valid = false;
            }

            for (slot, cost) in card.costs.iter().enumerate() {
                if *cost < 0 {
                    error!(name = %card.name, level = slot + 1, cost, "negative upgrade cost");
                    valid = false;
                }
            }
        }

        if valid {
            info!(upgrades = self.upgrades.len(), "upgrade database validated");
        } else {
            error!("upgrade database validation failed");
        }
        self.valid = Some(valid);
        valid
    }

    /// Adds a card unless one with the same name is already present.
    pub fn add(&mut self, card: UpgradeCard) -> bool {
        if self.by_name(&card.name).is_some() {
            warn!(name = %card.name, "upgrade already in database");
            return false;
        }
        info!(name = %card.name, "added upgrade to database");
        self.upgrades.push(Some(card));
        self.validate();
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<UpgradeCard> {
        let index = self
            .upgrades
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|card| card.name == name));
        let Some(index) = index else {
            warn!(name, "upgrade not found in database");
            return None;
        };
        let removed = self.upgrades.remove(index);
        self.validate();
        removed
    }

    /// Drops empty entries and orders by category, then name.
    pub fn sort(&mut self) {
        self.upgrades.retain(Option::is_some);
        self.upgrades.sort_by(|a, b| match (a, b) {
            (Some(a), Some(b)) => a
                .category
                .cmp(&b.category)
                .then_with(|| a.name.cmp(&b.name)),
            _ => std::cmp::Ordering::Equal,
        });
        self.validate();
    }
}
