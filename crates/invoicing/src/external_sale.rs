use serde::{Deserialize, Serialize};

use totes_core::{DomainError, DomainResult, Entity, EntityId, require_text};

/// A sale made outside the shop and reported afterwards by a partner.
///
/// The item name and customer email are copied at report time, the same way
/// invoices keep the customer's personal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSale {
    #[serde(default)]
    pub id: EntityId,
    pub reporter_name: String,
    pub reporter_id: String,
    pub item_id: EntityId,
    #[serde(default)]
    pub item_name: String,
    pub customer_id: EntityId,
    #[serde(default)]
    pub customer_email: String,
    /// Units sold.
    pub stock: i64,
}

impl Entity for ExternalSale {
    const KIND: &'static str = "external_sale";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("reporter_name", &self.reporter_name)?;
        require_text("reporter_id", &self.reporter_id)?;
        if !self.item_id.is_set() {
            return Err(DomainError::MissingField("item_id"));
        }
        if !self.customer_id.is_set() {
            return Err(DomainError::MissingField("customer_id"));
        }
        if self.stock <= 0 {
            return Err(DomainError::validation("stock must be positive"));
        }
        Ok(())
    }
}
