use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, require_text};

/// A cost attached to an item (shipping, packaging...), in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalExpense {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    pub item_id: EntityId,
    pub expense: i64,
    #[serde(default)]
    pub description: String,
}

impl Entity for AdditionalExpense {
    const KIND: &'static str = "additional_expense";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        if !self.item_id.is_set() {
            return Err(DomainError::MissingField("item_id"));
        }
        if self.expense < 0 {
            return Err(DomainError::validation("expense must not be negative"));
        }
        Ok(())
    }
}
