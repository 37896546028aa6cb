use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, require_text};

/// A stocked product or service. Prices are integer cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: i64,
    pub selling_price: i64,
    #[serde(default)]
    pub purchase_price: i64,
    /// `true` while the item can be sold.
    #[serde(default = "enabled")]
    pub item_state: bool,
    pub item_type_id: EntityId,
}

fn enabled() -> bool {
    true
}

impl Item {
    /// Whether `quantity` units can be served from current stock.
    pub fn has_enough_stock(&self, quantity: i64) -> DomainResult<bool> {
        if quantity < 0 {
            return Err(DomainError::validation(format!("quantity must not be negative, got {quantity}")));
        }
        Ok(self.stock >= quantity)
    }
}

impl Entity for Item {
    const KIND: &'static str = "item";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        if self.stock < 0 {
            return Err(DomainError::validation("stock must not be negative"));
        }
        if self.selling_price < 0 || self.purchase_price < 0 {
            return Err(DomainError::validation("prices must not be negative"));
        }
        if !self.item_type_id.is_set() {
            return Err(DomainError::MissingField("item_type_id"));
        }
        Ok(())
    }
}
