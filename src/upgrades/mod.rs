mod card;
mod database;
mod inventory;
mod stats;

pub use card::{GhostCard, StatDelta, UpgradeCard, UpgradeCategory, UpgradeInstance};
pub use database::UpgradeDatabase;
pub use inventory::PlayerInventory;
pub use stats::{owned_delta, upgraded_stats, GhostStats};

use tracing::warn;

use crate::error::PurchaseError;

/// Purchase front end: resolves upgrade names and refuses everything while the database is invalid.
#[derive(Clone, Debug)]
pub struct Shop {
    database: UpgradeDatabase,
    inventory: PlayerInventory,
}

impl Shop {
    pub fn new(mut database: UpgradeDatabase, inventory: PlayerInventory) -> Self {
        database.validate();
        Self {
            database,
            inventory,
        }
    }

    pub fn database(&self) -> &UpgradeDatabase {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut UpgradeDatabase {
        &mut self.database
    }

    pub fn inventory(&self) -> &PlayerInventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut PlayerInventory {
        &mut self.inventory
    }

    pub fn instance(&self, name: &str) -> Option<UpgradeInstance<'_>> {
        let card = self.database.by_name(name)?;
        Some(UpgradeInstance::new(
            card,
            self.inventory.current_level(name),
        ))
    }

    pub fn can_purchase(&self, name: &str, target_level: u32) -> bool {
        if !self.database.is_valid() {
            return false;
        }
        self.database
            .by_name(name)
            .is_some_and(|card| self.inventory.can_purchase(card, target_level))
    }

    pub fn try_purchase(&mut self, name: &str, target_level: u32) -> Result<u64, PurchaseError> {
        if !self.database.is_valid() {
            return Err(PurchaseError::InvalidDatabase);
        }
        let card = self
            .database
            .by_name(name)
            .ok_or_else(|| PurchaseError::UnknownUpgrade(name.to_string()))?;
        self.inventory.try_purchase(card, target_level)
    }

    pub fn purchase(&mut self, name: &str, target_level: u32) -> bool {
        match self.try_purchase(name, target_level) {
            Ok(_) => true,
            Err(error) => {
                warn!(name, level = target_level, %error, "purchase refused");
                false
            }
        }
    }

    /// Buys the next level of `name`.
    pub fn purchase_next(&mut self, name: &str) -> Result<u64, PurchaseError> {
        let next = self.inventory.current_level(name) + 1;
        self.try_purchase(name, next)
    }

    pub fn upgraded_stats(&self, cards: &[GhostCard]) -> Vec<GhostStats> {
        upgraded_stats(cards, &self.database, &self.inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(name: &str, costs: Vec<i64>) -> UpgradeCard {
        UpgradeCard {
            name: name.to_string(),
            category: UpgradeCategory::Speed,
            max_level: costs.len() as i32,
            costs,
            base_speed_increase: vec![1.0, 2.0, 3.0],
            ..UpgradeCard::default()
        }
    }

    #[test]
    fn shop_resolves_names_and_charges_inventory() {
        let db = UpgradeDatabase::from_cards(vec![card("Swift", vec![10, 20, 30])]);
        let mut shop = Shop::new(db, PlayerInventory::new(15));

        assert!(shop.can_purchase("Swift", 1));
        assert!(!shop.can_purchase("Swift", 2));
        assert_eq!(shop.purchase_next("Swift"), Ok(10));
        assert_eq!(shop.inventory().currency(), 5);
        assert_eq!(
            shop.try_purchase("Ghostly", 1),
            Err(PurchaseError::UnknownUpgrade("Ghostly".to_string()))
        );
        assert_eq!(shop.instance("Swift").map(|i| i.next_level_cost()), Some(20));
    }

    #[test]
    fn invalid_database_refuses_every_purchase() {
        let db = UpgradeDatabase::new(vec![Some(card("Swift", vec![10])), None]);
        let mut shop = Shop::new(db, PlayerInventory::new(1_000));
        assert!(!shop.can_purchase("Swift", 1));
        assert_eq!(
            shop.try_purchase("Swift", 1),
            Err(PurchaseError::InvalidDatabase)
        );
        assert!(!shop.purchase("Swift", 1));
        assert_eq!(shop.inventory().currency(), 1_000);
    }

    #[test]
    fn can_purchase_agrees_with_try_purchase_after_an_edit() {
        let db = UpgradeDatabase::from_cards(vec![card("Swift", vec![10])]);
        let mut shop = Shop::new(db, PlayerInventory::new(100));
        assert!(shop.database_mut().add(card("Sly", vec![5])));

        assert!(shop.can_purchase("Swift", 1));
        assert_eq!(shop.try_purchase("Swift", 1), Ok(10));
        assert!(!shop.can_purchase("Swift", 2));
    }

    #[test]
    fn editing_the_catalogue_triggers_revalidation() {
        let db = UpgradeDatabase::from_cards(vec![card("Swift", vec![10])]);
        let mut shop = Shop::new(db, PlayerInventory::new(100));
        shop.database_mut().add(card("Broken", vec![-1]));
        assert_eq!(
            shop.try_purchase("Swift", 1),
            Err(PurchaseError::InvalidDatabase)
        );
        shop.database_mut().remove("Broken");
        assert_eq!(shop.try_purchase("Swift", 1), Ok(10));
    }
}
